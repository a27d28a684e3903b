use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::{BindingError, ExportDescriptor, ExportedFunction, EXPORT_NAME};

/// Capability to publish an export into a host-owned table.
pub trait Registrar {
    fn register(&mut self, export: ExportedFunction) -> Result<(), BindingError>;
}

/// Publishes the `hello` export into `exports`.
///
/// Hosts call this once per loaded module. Calling it again on the same
/// registrar is a duplicate registration and its outcome is whatever that
/// registrar does with duplicates; [`ExportTable`] rejects them.
pub fn init<R: Registrar + ?Sized>(exports: &mut R) -> Result<(), BindingError> {
    debug!(name = EXPORT_NAME, "initializing module exports");
    exports.register(ExportedFunction::hello())
}

/// In-process export table, keyed by export name.
#[derive(Debug, Default, Clone)]
pub struct ExportTable {
    entries: BTreeMap<&'static str, ExportedFunction>,
}

impl ExportTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ExportedFunction> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    pub fn descriptors(&self) -> Vec<ExportDescriptor> {
        self.entries.values().map(ExportedFunction::describe).collect()
    }

    /// Invokes the export registered under `name`.
    pub fn call(&self, name: &str, arg: Option<&str>) -> Result<String, BindingError> {
        let export = self.get(name).ok_or_else(|| BindingError::UnknownExport {
            name: name.to_string(),
        })?;
        Ok(export.invoke(arg))
    }
}

impl Registrar for ExportTable {
    fn register(&mut self, export: ExportedFunction) -> Result<(), BindingError> {
        let name = export.name();
        if self.entries.contains_key(name) {
            warn!(name, "rejecting duplicate export");
            return Err(BindingError::DuplicateExport {
                name: name.to_string(),
            });
        }
        self.entries.insert(name, export);
        debug!(name, total = self.entries.len(), "registered export");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Registrar that refuses everything, standing in for a broken host.
    struct RejectingHost;

    impl Registrar for RejectingHost {
        fn register(&mut self, _export: ExportedFunction) -> Result<(), BindingError> {
            Err(BindingError::host("export object is frozen"))
        }
    }

    /// Records how many times `register` was called.
    #[derive(Default)]
    struct CountingHost {
        calls: Vec<&'static str>,
    }

    impl Registrar for CountingHost {
        fn register(&mut self, export: ExportedFunction) -> Result<(), BindingError> {
            self.calls.push(export.name());
            Ok(())
        }
    }

    #[test]
    fn test_new_table_is_empty() {
        let table = ExportTable::new();
        assert!(table.is_empty());
        assert_eq!(table.names().count(), 0);
    }

    #[test]
    fn test_init_registers_exactly_one_export() {
        let mut table = ExportTable::new();
        init(&mut table).unwrap();

        assert_eq!(table.len(), 1);
        assert!(table.contains("hello"));
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["hello"]);
    }

    #[test]
    fn test_init_calls_register_once() {
        let mut host = CountingHost::default();
        init(&mut host).unwrap();
        assert_eq!(host.calls, vec!["hello"]);
    }

    #[test]
    fn test_second_init_is_rejected_and_table_unchanged() {
        let mut table = ExportTable::new();
        init(&mut table).unwrap();

        let err = init(&mut table).unwrap_err();
        assert_eq!(
            err,
            BindingError::DuplicateExport {
                name: "hello".to_string()
            }
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.call("hello", None).unwrap(), "Hello World!");
    }

    #[test]
    fn test_host_failure_propagates_from_init() {
        let err = init(&mut RejectingHost).unwrap_err();
        assert!(matches!(err, BindingError::HostBindingFailure(_)));
        assert_eq!(err.to_string(), "host binding failure: export object is frozen");
    }

    #[test]
    fn test_init_through_trait_object() {
        let mut table = ExportTable::new();
        let registrar: &mut dyn Registrar = &mut table;
        init(registrar).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_call_unknown_export() {
        let mut table = ExportTable::new();
        init(&mut table).unwrap();

        let err = table.call("goodbye", None).unwrap_err();
        assert_eq!(
            err,
            BindingError::UnknownExport {
                name: "goodbye".to_string()
            }
        );
    }

    #[test]
    fn test_calls_do_not_mutate_table() {
        let mut table = ExportTable::new();
        init(&mut table).unwrap();
        let before = table.descriptors();

        for i in 0..100 {
            table.call("hello", Some(i.to_string().as_str())).unwrap();
            table.call("hello", None).unwrap();
        }

        assert_eq!(table.descriptors(), before);
        assert_eq!(table.len(), 1);
    }
}
