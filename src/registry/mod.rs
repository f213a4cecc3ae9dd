//! Type Registry
//!
//! Holds type declarations grouped by package and answers property-ordering
//! queries for the mask adapter. Every class-backed declared type owns a
//! transformed-mask cache, and every cache is cleared whenever a declaration
//! changes.

pub mod declarations;

use crate::error::{ConfigError, PropagationError};
use crate::mask::TransformedMaskCache;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

pub use declarations::{DeclarationFile, TypeEntry};

/// Package of the universal base types. Masks are never remapped onto it.
pub const BASE_PACKAGE: &str = "lang";

/// Name of the universal "unknown" class inside [`BASE_PACKAGE`].
pub const ANY_CLASS: &str = "Any";

/// A concrete or structural (interface-like) class known to the rule base
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassDescriptor {
    package: String,
    name: String,
    structural: bool,
}

impl ClassDescriptor {
    pub fn concrete(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            structural: false,
        }
    }

    pub fn structural(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            structural: true,
        }
    }

    /// The universal class used when the modified type is not known.
    pub fn universal() -> Self {
        Self::concrete(BASE_PACKAGE, ANY_CLASS)
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_structural(&self) -> bool {
        self.structural
    }

    pub fn is_universal(&self) -> bool {
        self.package == BASE_PACKAGE && self.name == ANY_CLASS
    }

    pub fn qualified_name(&self) -> String {
        qualify(&self.package, &self.name)
    }
}

impl fmt::Display for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.package, self.name)
    }
}

fn qualify(package: &str, name: &str) -> String {
    format!("{}.{}", package, name)
}

/// Declared type backed by a class, carrying its transformed-mask cache.
///
/// Handles stay valid across redeclarations: the registry swaps the class in
/// place and resets the cache rather than issuing a new handle.
#[derive(Debug)]
pub struct ClassObjectType {
    class: RwLock<Arc<ClassDescriptor>>,
    cache: TransformedMaskCache,
}

impl ClassObjectType {
    pub fn new(class: Arc<ClassDescriptor>) -> Self {
        Self::at_generation(class, 0)
    }

    fn at_generation(class: Arc<ClassDescriptor>, generation: u64) -> Self {
        Self {
            class: RwLock::new(class),
            cache: TransformedMaskCache::at_generation(generation),
        }
    }

    pub fn class(&self) -> Arc<ClassDescriptor> {
        self.class.read().clone()
    }

    pub fn cache(&self) -> &TransformedMaskCache {
        &self.cache
    }

    fn replace_class(&self, class: Arc<ClassDescriptor>) {
        *self.class.write() = class;
    }
}

/// The type a pattern-matching node is indexed on
#[derive(Debug)]
pub enum DeclaredType {
    /// Backed by a class; eligible for mask adaptation.
    Class(ClassObjectType),
    /// Not backed by a class (e.g. a fact template); masks pass through unchanged.
    Template(String),
}

impl DeclaredType {
    pub fn for_class(class: Arc<ClassDescriptor>) -> Self {
        DeclaredType::Class(ClassObjectType::new(class))
    }

    pub fn as_class(&self) -> Option<&ClassObjectType> {
        match self {
            DeclaredType::Class(object_type) => Some(object_type),
            DeclaredType::Template(_) => None,
        }
    }

    pub fn name(&self) -> String {
        match self {
            DeclaredType::Class(object_type) => object_type.class().qualified_name(),
            DeclaredType::Template(name) => name.clone(),
        }
    }
}

/// Source of per-type property orderings; position in the list is the bit position.
pub trait PropertyOrderingProvider: Send + Sync {
    fn settable_properties(
        &self,
        package: &str,
        class: &ClassDescriptor,
    ) -> Result<Arc<[String]>, PropagationError>;

    /// Declaration generation the orderings belong to. Translations computed
    /// from one generation are never cached into a later one.
    fn generation(&self) -> u64 {
        0
    }
}

/// A registered class and its ordered settable properties
#[derive(Debug, Clone)]
pub struct TypeDeclaration {
    pub class: Arc<ClassDescriptor>,
    pub settable_properties: Arc<[String]>,
}

impl TypeDeclaration {
    pub fn new<I, S>(class: ClassDescriptor, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            class: Arc::new(class),
            settable_properties: properties.into_iter().map(Into::into).collect(),
        }
    }

    /// Bit position of a property in this declaration's ordering
    pub fn position_of(&self, property: &str) -> Option<usize> {
        self.settable_properties.iter().position(|p| p == property)
    }
}

#[derive(Default)]
struct RegistryState {
    /// package -> class name -> declaration
    packages: HashMap<String, HashMap<String, TypeDeclaration>>,
    /// qualified name -> declared type
    declared: HashMap<String, Arc<DeclaredType>>,
    /// Bumped by every class declaration
    generation: u64,
}

/// In-memory registry of type declarations
#[derive(Default)]
pub struct TypeRegistry {
    state: RwLock<RegistryState>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a class declaration.
    ///
    /// Any change starts a new declaration generation and resets the
    /// transformed-mask cache of every class-backed declared type. A
    /// redeclared class keeps its existing handle.
    pub fn declare(&self, declaration: TypeDeclaration) -> Arc<DeclaredType> {
        let class = declaration.class.clone();
        let qualified = class.qualified_name();
        let mut state = self.state.write();
        state.generation += 1;
        let generation = state.generation;

        let replaced = state
            .packages
            .entry(class.package().to_string())
            .or_default()
            .insert(class.name().to_string(), declaration)
            .is_some();

        for declared in state.declared.values() {
            if let Some(object_type) = declared.as_class() {
                object_type.cache().reset(generation);
            }
        }

        let existing = state
            .declared
            .get(&qualified)
            .filter(|declared| declared.as_class().is_some())
            .cloned();
        let declared = match existing {
            Some(declared) => {
                if let Some(object_type) = declared.as_class() {
                    object_type.replace_class(class);
                }
                declared
            }
            None => {
                let declared = Arc::new(DeclaredType::Class(ClassObjectType::at_generation(
                    class, generation,
                )));
                state.declared.insert(qualified.clone(), declared.clone());
                declared
            }
        };

        if replaced {
            info!(class = %qualified, generation, "Type redeclared, mask caches rebuilt");
        } else {
            debug!(class = %qualified, generation, "Type declared");
        }
        declared
    }

    /// Register a declared type that is not backed by a class.
    ///
    /// Fails if a class is already declared under `name`.
    pub fn declare_template(&self, name: impl Into<String>) -> Result<Arc<DeclaredType>, ConfigError> {
        let name = name.into();
        let mut state = self.state.write();
        if state
            .declared
            .get(&name)
            .is_some_and(|declared| declared.as_class().is_some())
        {
            return Err(ConfigError::Invalid(format!(
                "Template '{}' collides with a declared class",
                name
            )));
        }
        let declared = Arc::new(DeclaredType::Template(name.clone()));
        state.declared.insert(name, declared.clone());
        Ok(declared)
    }

    pub fn declared_type(&self, qualified_name: &str) -> Option<Arc<DeclaredType>> {
        self.state.read().declared.get(qualified_name).cloned()
    }

    pub fn class(&self, qualified_name: &str) -> Option<Arc<ClassDescriptor>> {
        self.declared_type(qualified_name)
            .and_then(|declared| declared.as_class().map(ClassObjectType::class))
    }

    pub fn declaration(&self, package: &str, class_name: &str) -> Option<TypeDeclaration> {
        self.state
            .read()
            .packages
            .get(package)
            .and_then(|types| types.get(class_name))
            .cloned()
    }

    pub fn has_declaration(&self, class: &ClassDescriptor) -> bool {
        self.declaration(class.package(), class.name()).is_some()
    }

    /// All class declarations ordered by qualified name
    pub fn declarations(&self) -> Vec<TypeDeclaration> {
        let state = self.state.read();
        let mut out: Vec<TypeDeclaration> = state
            .packages
            .values()
            .flat_map(|types| types.values().cloned())
            .collect();
        out.sort_by_key(|d| d.class.qualified_name());
        out
    }

    pub fn len(&self) -> usize {
        self.state.read().packages.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PropertyOrderingProvider for TypeRegistry {
    fn generation(&self) -> u64 {
        self.state.read().generation
    }

    fn settable_properties(
        &self,
        package: &str,
        class: &ClassDescriptor,
    ) -> Result<Arc<[String]>, PropagationError> {
        self.declaration(package, class.name())
            .map(|d| d.settable_properties)
            .ok_or_else(|| PropagationError::TypeAdaptationUnsupported {
                package: package.to_string(),
                class: class.name().to_string(),
            })
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("declarations", &self.len())
            .finish()
    }
}
