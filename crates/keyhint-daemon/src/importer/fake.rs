//! In-memory binding sources for tests

use futures::future::BoxFuture;
use keyhint_core::RawBinding;

use super::{BindingSource, ImportError, ImportSource};

pub(crate) struct StaticSource {
    pub source: ImportSource,
    pub bindings: Vec<(&'static str, &'static str)>,
}

impl BindingSource for StaticSource {
    fn source(&self) -> ImportSource {
        self.source
    }

    fn read_bindings(&self) -> BoxFuture<'_, Result<Vec<RawBinding>, ImportError>> {
        let bindings = self
            .bindings
            .iter()
            .map(|(action, binding)| RawBinding::new(*action, *binding))
            .collect();
        Box::pin(async move { Ok(bindings) })
    }
}

/// A source whose schema is not installed.
pub(crate) struct FailingSource(pub ImportSource);

impl BindingSource for FailingSource {
    fn source(&self) -> ImportSource {
        self.0
    }

    fn read_bindings(&self) -> BoxFuture<'_, Result<Vec<RawBinding>, ImportError>> {
        let schema = self.0.schema().to_string();
        Box::pin(async move {
            Err(ImportError::Unavailable {
                schema,
                message: "No such schema".to_string(),
            })
        })
    }
}

pub(crate) fn boxed(source: impl BindingSource + 'static) -> Box<dyn BindingSource> {
    Box::new(source)
}
