use std::collections::HashMap;
use std::fmt;

/// A lightweight, copyable handle to a type in the [`TypeRegistry`].
///
/// Ids below [`TypeId::USER_START`] are reserved for builtins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(u64);

impl TypeId {
    pub const INT: TypeId = TypeId(0);
    pub const FLOAT: TypeId = TypeId(1);
    pub const TEXT: TypeId = TypeId(2);
    pub const BOOL: TypeId = TypeId(3);
    pub const UNIT: TypeId = TypeId(4);
    pub const NULL: TypeId = TypeId(5);

    /// First id handed out for non-builtin types.
    pub const USER_START: u64 = 1000;

    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The structure of a type, independent of how values of it are managed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Int,
    Float,
    Text,
    Bool,
    Unit,
    /// The type of the `null` literal; assignable to any `T?`.
    Null,
    /// Fixed-size array `[T; N]`.
    Array { element: TypeId, size: usize },
    /// Nullable type `T?`.
    Optional { inner: TypeId },
    /// Function type `fun(params): ret`.
    Function { params: Vec<TypeId>, ret: TypeId },
}

impl TypeKind {
    pub const fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::Int | Self::Float | Self::Text | Self::Bool | Self::Unit | Self::Null
        )
    }
}

/// How values of a type are managed.
///
/// Rive uses automatic value semantics: every assignment behaves like a
/// copy, and the strategy decides how that copy is realized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemoryStrategy {
    /// Bitwise copy on the stack (`Int`, `Float`, `Bool`, `Unit`).
    Copy,
    /// Logical copy via reference counting with copy-on-write (`Text`,
    /// arrays of non-copy elements).
    CoW,
    /// Move-only, single ownership. Reserved for `@unique` resources.
    Unique,
}

impl MemoryStrategy {
    pub const fn is_copy(self) -> bool {
        matches!(self, Self::Copy)
    }
}

impl fmt::Display for MemoryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy => write!(f, "copy"),
            Self::CoW => write!(f, "cow"),
            Self::Unique => write!(f, "unique"),
        }
    }
}

/// Everything the compiler knows about one registered type.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeMetadata {
    pub id: TypeId,
    pub kind: TypeKind,
    pub strategy: MemoryStrategy,
}

/// Interning registry for all types seen during a compilation.
///
/// Structurally identical composites share a single [`TypeId`], so id
/// equality is type equality for everything the registry hands out.
#[derive(Clone, Debug)]
pub struct TypeRegistry {
    types: HashMap<TypeId, TypeMetadata>,
    interned: HashMap<TypeKind, TypeId>,
    next_id: u64,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            types: HashMap::new(),
            interned: HashMap::new(),
            next_id: TypeId::USER_START,
        };
        registry.register_builtin(TypeId::INT, TypeKind::Int, MemoryStrategy::Copy);
        registry.register_builtin(TypeId::FLOAT, TypeKind::Float, MemoryStrategy::Copy);
        registry.register_builtin(TypeId::TEXT, TypeKind::Text, MemoryStrategy::CoW);
        registry.register_builtin(TypeId::BOOL, TypeKind::Bool, MemoryStrategy::Copy);
        registry.register_builtin(TypeId::UNIT, TypeKind::Unit, MemoryStrategy::Copy);
        registry.register_builtin(TypeId::NULL, TypeKind::Null, MemoryStrategy::Copy);
        registry
    }

    fn register_builtin(&mut self, id: TypeId, kind: TypeKind, strategy: MemoryStrategy) {
        self.interned.insert(kind.clone(), id);
        self.types.insert(id, TypeMetadata { id, kind, strategy });
    }

    pub fn get(&self, id: TypeId) -> Option<&TypeMetadata> {
        self.types.get(&id)
    }

    pub fn kind(&self, id: TypeId) -> Option<&TypeKind> {
        self.types.get(&id).map(|meta| &meta.kind)
    }

    /// The memory strategy for `id`, defaulting to CoW for unknown ids.
    pub fn strategy(&self, id: TypeId) -> MemoryStrategy {
        self.types
            .get(&id)
            .map_or(MemoryStrategy::CoW, |meta| meta.strategy)
    }

    /// Interns `kind`, reusing the existing id for structurally identical
    /// types.
    pub fn intern(&mut self, kind: TypeKind) -> TypeId {
        if let Some(&id) = self.interned.get(&kind) {
            return id;
        }
        let id = TypeId::new(self.next_id);
        self.next_id += 1;
        let strategy = self.strategy_for(&kind);
        self.interned.insert(kind.clone(), id);
        self.types.insert(id, TypeMetadata { id, kind, strategy });
        id
    }

    pub fn array_of(&mut self, element: TypeId, size: usize) -> TypeId {
        self.intern(TypeKind::Array { element, size })
    }

    pub fn optional_of(&mut self, inner: TypeId) -> TypeId {
        // Flatten `T??` to `T?`; nullability is not nested.
        if matches!(self.kind(inner), Some(TypeKind::Optional { .. })) {
            return inner;
        }
        self.intern(TypeKind::Optional { inner })
    }

    pub fn function_of(&mut self, params: Vec<TypeId>, ret: TypeId) -> TypeId {
        self.intern(TypeKind::Function { params, ret })
    }

    /// Returns `T` for an `T?` id.
    pub fn nullable_inner(&self, id: TypeId) -> Option<TypeId> {
        match self.kind(id)? {
            TypeKind::Optional { inner } => Some(*inner),
            _ => None,
        }
    }

    /// Whether a value of `source` may be bound where `target` is expected.
    ///
    /// Beyond id equality this admits the two implicit coercions of the
    /// language: `T → T?` and `Null → T?`.
    pub fn is_assignable(&self, target: TypeId, source: TypeId) -> bool {
        if target == source {
            return true;
        }
        match self.kind(target) {
            Some(TypeKind::Optional { inner }) => {
                source == TypeId::NULL || *inner == source || self.is_assignable(*inner, source)
            }
            _ => false,
        }
    }

    /// Whether binding `source` where `target: T?` is expected requires a
    /// `T → T?` wrap (as opposed to already being optional or null).
    pub fn needs_optional_wrap(&self, target: TypeId, source: TypeId) -> bool {
        target != source
            && source != TypeId::NULL
            && matches!(self.kind(target), Some(TypeKind::Optional { .. }))
            && self.is_assignable(target, source)
    }

    /// Human-readable type name for diagnostics (`Int?`, `[Text; 3]`, ...).
    pub fn display_name(&self, id: TypeId) -> String {
        let Some(kind) = self.kind(id) else {
            return format!("<unknown {id}>");
        };
        match kind {
            TypeKind::Int => "Int".to_string(),
            TypeKind::Float => "Float".to_string(),
            TypeKind::Text => "Text".to_string(),
            TypeKind::Bool => "Bool".to_string(),
            TypeKind::Unit => "Unit".to_string(),
            TypeKind::Null => "Null".to_string(),
            TypeKind::Array { element, size } => {
                format!("[{}; {size}]", self.display_name(*element))
            }
            TypeKind::Optional { inner } => format!("{}?", self.display_name(*inner)),
            TypeKind::Function { params, ret } => {
                let params = params
                    .iter()
                    .map(|p| self.display_name(*p))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("fun({params}): {}", self.display_name(*ret))
            }
        }
    }

    fn strategy_for(&self, kind: &TypeKind) -> MemoryStrategy {
        match kind {
            TypeKind::Int | TypeKind::Float | TypeKind::Bool | TypeKind::Unit | TypeKind::Null => {
                MemoryStrategy::Copy
            }
            TypeKind::Text => MemoryStrategy::CoW,
            TypeKind::Array { element, .. } | TypeKind::Optional { inner: element } => {
                if self.strategy(*element).is_copy() {
                    MemoryStrategy::Copy
                } else {
                    MemoryStrategy::CoW
                }
            }
            // Function values are plain pointers.
            TypeKind::Function { .. } => MemoryStrategy::Copy,
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        let registry = TypeRegistry::new();
        assert_eq!(registry.kind(TypeId::INT), Some(&TypeKind::Int));
        assert_eq!(registry.kind(TypeId::TEXT), Some(&TypeKind::Text));
        assert!(registry.strategy(TypeId::INT).is_copy());
        assert_eq!(registry.strategy(TypeId::TEXT), MemoryStrategy::CoW);
    }

    #[test]
    fn composites_are_interned() {
        let mut registry = TypeRegistry::new();
        let a = registry.array_of(TypeId::INT, 3);
        let b = registry.array_of(TypeId::INT, 3);
        let c = registry.array_of(TypeId::INT, 4);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let opt1 = registry.optional_of(TypeId::TEXT);
        let opt2 = registry.optional_of(TypeId::TEXT);
        assert_eq!(opt1, opt2);
    }

    #[test]
    fn optional_does_not_nest() {
        let mut registry = TypeRegistry::new();
        let opt = registry.optional_of(TypeId::INT);
        assert_eq!(registry.optional_of(opt), opt);
    }

    #[test]
    fn assignability_admits_nullable_coercions() {
        let mut registry = TypeRegistry::new();
        let opt_int = registry.optional_of(TypeId::INT);

        assert!(registry.is_assignable(TypeId::INT, TypeId::INT));
        assert!(registry.is_assignable(opt_int, TypeId::INT));
        assert!(registry.is_assignable(opt_int, TypeId::NULL));
        assert!(!registry.is_assignable(TypeId::INT, opt_int));
        assert!(!registry.is_assignable(TypeId::INT, TypeId::FLOAT));
    }

    #[test]
    fn wrap_detection_only_fires_on_bare_inner_values() {
        let mut registry = TypeRegistry::new();
        let opt_int = registry.optional_of(TypeId::INT);

        assert!(registry.needs_optional_wrap(opt_int, TypeId::INT));
        assert!(!registry.needs_optional_wrap(opt_int, TypeId::NULL));
        assert!(!registry.needs_optional_wrap(opt_int, opt_int));
        assert!(!registry.needs_optional_wrap(TypeId::INT, TypeId::INT));
    }

    #[test]
    fn display_names_render_composites() {
        let mut registry = TypeRegistry::new();
        let opt_int = registry.optional_of(TypeId::INT);
        let arr = registry.array_of(opt_int, 2);
        let f = registry.function_of(vec![TypeId::INT, TypeId::TEXT], TypeId::BOOL);

        assert_eq!(registry.display_name(opt_int), "Int?");
        assert_eq!(registry.display_name(arr), "[Int?; 2]");
        assert_eq!(registry.display_name(f), "fun(Int, Text): Bool");
    }

    #[test]
    fn array_strategy_follows_elements() {
        let mut registry = TypeRegistry::new();
        let ints = registry.array_of(TypeId::INT, 8);
        let texts = registry.array_of(TypeId::TEXT, 8);
        assert!(registry.strategy(ints).is_copy());
        assert_eq!(registry.strategy(texts), MemoryStrategy::CoW);
    }
}
