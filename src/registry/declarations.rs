//! Type declaration files.
//!
//! ```toml
//! templates = ["Reading"]
//!
//! [[types]]
//! package = "pets"
//! name = "Dog"
//! properties = ["name", "age", "owner"]
//!
//! [[types]]
//! package = "pets"
//! name = "Pet"
//! structural = true
//! properties = ["owner", "name"]
//! ```

use crate::error::ConfigError;
use crate::mask::BitMask;
use crate::registry::{ClassDescriptor, TypeDeclaration, TypeRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeclarationFile {
    #[serde(default)]
    pub templates: Vec<String>,

    #[serde(default)]
    pub types: Vec<TypeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeEntry {
    pub package: String,
    pub name: String,

    /// Interface-like type whose ordering is shared by several classes
    #[serde(default)]
    pub structural: bool,

    /// Settable properties in bit order
    #[serde(default)]
    pub properties: Vec<String>,
}

impl TypeEntry {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.package.trim().is_empty() || self.name.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "Type declaration '{}.{}' needs a package and a name",
                self.package, self.name
            )));
        }

        let mut seen = HashSet::new();
        for property in &self.properties {
            if !seen.insert(property.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "Type '{}.{}' declares property '{}' twice",
                    self.package, self.name, property
                )));
            }
        }

        if self.properties.len() > BitMask::WIDTH {
            warn!(
                class = %format!("{}.{}", self.package, self.name),
                properties = self.properties.len(),
                "Only the first {} properties are tracked by modification masks",
                BitMask::WIDTH
            );
        }
        Ok(())
    }

    fn into_declaration(self) -> TypeDeclaration {
        let class = if self.structural {
            ClassDescriptor::structural(self.package, self.name)
        } else {
            ClassDescriptor::concrete(self.package, self.name)
        };
        TypeDeclaration::new(class, self.properties)
    }
}

impl DeclarationFile {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let file: DeclarationFile = toml::from_str(text)?;
        for entry in &file.types {
            entry.validate()?;
        }
        Ok(file)
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Register every declaration; returns the number of class declarations applied.
    pub fn apply(self, registry: &TypeRegistry) -> Result<usize, ConfigError> {
        let count = self.types.len();
        for entry in self.types {
            registry.declare(entry.into_declaration());
        }
        for template in self.templates {
            registry.declare_template(template)?;
        }
        Ok(count)
    }
}

impl TypeRegistry {
    /// Load declarations from a TOML file into this registry.
    pub fn load_declarations(&self, path: &Path) -> Result<usize, ConfigError> {
        let count = DeclarationFile::read(path)?.apply(self)?;
        info!(path = %path.display(), types = count, "Loaded type declarations");
        Ok(count)
    }

    pub fn from_declarations(path: &Path) -> Result<Self, ConfigError> {
        let registry = Self::new();
        registry.load_declarations(path)?;
        Ok(registry)
    }
}
