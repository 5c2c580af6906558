use redb::TableDefinition;

/// Browser-style local storage: key -> raw string value
pub const LOCAL_STORAGE: TableDefinition<&str, &str> = TableDefinition::new("local_storage");
