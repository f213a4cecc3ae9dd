//! CLI route: run context and command dispatch.

use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_adapt_report, format_inspect_report, format_types_report, AdaptReport, InspectReport,
    TypeReport,
};
use crate::config::{ConfigLoader, RippleConfig};
use crate::context::EventKind;
use crate::marshal::ContextRecord;
use crate::mask::BitMask;
use crate::registry::TypeRegistry;
use crate::session::Session;
use crate::types::FactHandle;
use anyhow::{anyhow, bail, Context};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Runtime context for CLI execution
pub struct RunContext {
    config: RippleConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Ok(Self { config })
    }

    pub fn from_config(config: RippleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RippleConfig {
        &self.config
    }

    pub fn execute(&self, command: &Commands) -> anyhow::Result<String> {
        match command {
            Commands::Adapt {
                types,
                from,
                to,
                changed,
                format,
            } => self.adapt(types.as_deref(), from, to, changed, format),
            Commands::Inspect { hex, format } => inspect(hex, format),
            Commands::Types { types, format } => self.types(types.as_deref(), format),
        }
    }

    fn registry(&self, types: Option<&Path>) -> anyhow::Result<Arc<TypeRegistry>> {
        let path = types
            .map(Path::to_path_buf)
            .or_else(|| self.config.session.declarations.clone())
            .ok_or_else(|| anyhow!("no type declarations: pass --types or set session.declarations"))?;
        let registry = TypeRegistry::from_declarations(&path)
            .with_context(|| format!("loading declarations from {}", path.display()))?;
        Ok(Arc::new(registry))
    }

    fn adapt(
        &self,
        types: Option<&Path>,
        from: &str,
        to: &str,
        changed: &[String],
        format: &str,
    ) -> anyhow::Result<String> {
        let registry = self.registry(types)?;
        let from_class = registry
            .class(from)
            .ok_or_else(|| anyhow!("unknown class '{}'", from))?;
        let target = registry
            .declared_type(to)
            .ok_or_else(|| anyhow!("unknown declared type '{}'", to))?;
        let declaration = registry
            .declaration(from_class.package(), from_class.name())
            .ok_or_else(|| anyhow!("class '{}' has no property ordering", from))?;

        let mut positions = Vec::with_capacity(changed.len());
        for property in changed {
            match declaration.position_of(property) {
                Some(pos) => positions.push(pos),
                None => bail!("'{}' is not a property of {}", property, from),
            }
        }
        let mask = BitMask::from_positions(positions);

        let session = Session::with_registry(registry.clone(), &self.config.session);
        let mut ctx = session.new_modification_context(
            EventKind::Update,
            None,
            None,
            FactHandle::new(0),
            mask,
            from_class,
        );
        let adapted = ctx.adapt_mask_for(&target, &session)?.modification_mask();
        info!(from, to, original = %mask, adapted = %adapted, "Mask adapted");

        let target_properties = match target.as_class() {
            Some(object_type) => registry
                .declaration(object_type.class().package(), object_type.class().name())
                .map(|d| d.settable_properties.to_vec())
                .unwrap_or_default(),
            None => Vec::new(),
        };
        let report = AdaptReport::new(from, to, mask, adapted, &target_properties);
        format_adapt_report(&report, format)
    }

    fn types(&self, types: Option<&Path>, format: &str) -> anyhow::Result<String> {
        let registry = self.registry(types)?;
        let reports: Vec<TypeReport> = registry
            .declarations()
            .iter()
            .map(TypeReport::from_declaration)
            .collect();
        format_types_report(&reports, format)
    }
}

fn inspect(hex_record: &str, format: &str) -> anyhow::Result<String> {
    let bytes = hex::decode(hex_record.trim()).context("record is not valid hex")?;
    let record = ContextRecord::decode(&bytes)?;
    let report = InspectReport::from_record(&record)?;
    format_inspect_report(&report, format)
}
