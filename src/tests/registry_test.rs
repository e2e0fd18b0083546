#[cfg(test)]
mod tests {
    use crate::process::ManagedProcess;
    use crate::registry::Registry;

    fn process(name: &str) -> ManagedProcess {
        ManagedProcess::new(name, "sleep 30", "/tmp", false, false)
    }

    #[test]
    fn insertion_order_is_preserved_in_list() {
        let mut registry = Registry::new();
        registry.add(process("c")).unwrap();
        registry.add(process("a")).unwrap();
        registry.add(process("b")).unwrap();

        let names: Vec<&str> = registry.list().map(|p| p.name()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn duplicate_add_is_rejected_and_leaves_registry_unchanged() {
        let mut registry = Registry::new();
        registry.add(process("p1")).unwrap();

        let err = registry.add(process("p1")).unwrap_err();
        assert!(matches!(err, crate::error::DaemonError::Duplicate(name) if name == "p1"));
        assert_eq!(registry.names().count(), 1);
    }

    #[test]
    fn remove_drops_from_order_and_log_subsets() {
        let mut registry = Registry::new();
        registry.add(ManagedProcess::new("p1", "sleep 30", "/tmp", true, true)).unwrap();
        assert!(registry.log_cpu_set().contains("p1"));
        assert!(registry.log_mem_set().contains("p1"));

        registry.remove("p1").unwrap();
        assert!(registry.find("p1").is_err());
        assert!(!registry.log_cpu_set().contains("p1"));
        assert!(!registry.log_mem_set().contains("p1"));
    }

    #[test]
    fn find_on_missing_name_is_not_found() {
        let registry = Registry::new();
        let err = registry.find("ghost").unwrap_err();
        assert!(matches!(err, crate::error::DaemonError::NotFound(name) if name == "ghost"));
    }
}
