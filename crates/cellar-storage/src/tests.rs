#[cfg(test)]
mod tests {
    use crate::catalog::{Catalog, StoreOptions};
    use crate::table::AlterTable;
    use cellar_core::ErrorKind;
    use tempfile::TempDir;

    async fn open_catalog(dir: &TempDir) -> Catalog {
        let data_dir = dir.path().join("data");
        Catalog::open(StoreOptions::new(data_dir.to_string_lossy().to_string()))
            .await
            .expect("open")
    }

    fn families(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn create_and_describe() {
        let dir = TempDir::new().expect("tempdir");
        let catalog = open_catalog(&dir).await;
        let meta = catalog
            .create("users", &families(&["info", "stats", "info"]), 3)
            .await
            .expect("create");
        assert_eq!(meta.column_families, vec!["info", "stats"]);
        assert!(!meta.disabled);
        assert_eq!(meta.row_count, 0);
        assert_eq!(meta.max_versions, 3);
        assert!(catalog.exists("users").await.expect("exists"));

        let described = catalog.describe("users").await.expect("describe");
        assert_eq!(described, meta);
    }

    #[tokio::test]
    async fn create_validates_arguments() {
        let dir = TempDir::new().expect("tempdir");
        let catalog = open_catalog(&dir).await;
        let err = catalog.create("t", &[], 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = catalog.create("t", &families(&["cf"]), 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = catalog.create("t", &families(&["cf", " "]), 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = catalog.create("", &families(&["cf"]), 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(catalog.list().await.expect("list").is_empty());

        catalog.create("t", &families(&["cf"]), 1).await.expect("create");
        let err = catalog.create("t", &families(&["cf"]), 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn drop_requires_disabled_table() {
        let dir = TempDir::new().expect("tempdir");
        let catalog = open_catalog(&dir).await;
        catalog.create("t", &families(&["cf"]), 1).await.expect("create");

        let err = catalog.drop("t").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        catalog.table("t").await.expect("table").disable().await.expect("disable");
        catalog.drop("t").await.expect("drop");
        assert!(!catalog.exists("t").await.expect("exists"));

        let err = catalog.drop("t").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn drop_all_reports_each_table() {
        let dir = TempDir::new().expect("tempdir");
        let catalog = open_catalog(&dir).await;
        for name in ["a", "b", "c"] {
            catalog.create(name, &families(&["cf"]), 1).await.expect("create");
        }
        for name in ["a", "c"] {
            catalog.table(name).await.expect("table").disable().await.expect("disable");
        }
        let report = catalog.drop_all().await.expect("drop_all");
        assert!(!report.success());
        let mut dropped = report.succeeded.clone();
        dropped.sort();
        assert_eq!(dropped, vec!["a", "c"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "b");
        assert_eq!(report.failed[0].1.kind(), ErrorKind::InvalidState);
        assert_eq!(catalog.list().await.expect("list"), vec!["b"]);
    }

    #[tokio::test]
    async fn enable_disable_is_idempotent() {
        let dir = TempDir::new().expect("tempdir");
        let catalog = open_catalog(&dir).await;
        catalog.create("t", &families(&["cf"]), 1).await.expect("create");
        let table = catalog.table("t").await.expect("table");

        let before = table.describe().await.expect("describe").updated_at;
        table.enable().await.expect("enable");
        let after = table.describe().await.expect("describe").updated_at;
        assert!(after > before);
        assert!(table.is_enabled().await.expect("is_enabled"));

        table.disable().await.expect("disable");
        table.disable().await.expect("disable again");
        assert!(!table.is_enabled().await.expect("is_enabled"));
    }

    #[tokio::test]
    async fn alter_requires_disabled_and_a_change() {
        let dir = TempDir::new().expect("tempdir");
        let catalog = open_catalog(&dir).await;
        catalog.create("t", &families(&["cf"]), 1).await.expect("create");
        let mut table = catalog.table("t").await.expect("table");

        let change = AlterTable {
            new_name: None,
            add_column_family: Some("extra".into()),
        };
        let err = table.alter(change.clone()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        table.disable().await.expect("disable");
        let err = table.alter(AlterTable::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let meta = table.alter(change.clone()).await.expect("alter");
        assert_eq!(meta.column_families, vec!["cf", "extra"]);
        let err = table.alter(change).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn alter_renames_and_adds_family_together() {
        let dir = TempDir::new().expect("tempdir");
        let catalog = open_catalog(&dir).await;
        let original = catalog.create("old", &families(&["cf"]), 1).await.expect("create");
        catalog.create("taken", &families(&["cf"]), 1).await.expect("create");
        let mut table = catalog.table("old").await.expect("table");
        table.disable().await.expect("disable");

        let err = table
            .alter(AlterTable {
                new_name: Some("taken".into()),
                add_column_family: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        let meta = table
            .alter(AlterTable {
                new_name: Some("fresh".into()),
                add_column_family: Some("more".into()),
            })
            .await
            .expect("alter");
        assert_eq!(table.name(), "fresh");
        assert_eq!(meta.table_id, original.table_id);
        assert!(!catalog.exists("old").await.expect("exists"));

        let described = catalog.describe("fresh").await.expect("describe");
        assert_eq!(described.table_name, "fresh");
        assert_eq!(described.column_families, vec!["cf", "more"]);
        assert!(described.disabled);
    }

    #[tokio::test]
    async fn locks_are_released_after_drop_and_rename() {
        let dir = TempDir::new().expect("tempdir");
        let catalog = open_catalog(&dir).await;
        catalog.create("a", &families(&["cf"]), 1).await.expect("create");
        let mut table = catalog.table("a").await.expect("table");
        table.disable().await.expect("disable");
        table
            .alter(AlterTable {
                new_name: Some("b".into()),
                add_column_family: None,
            })
            .await
            .expect("alter");
        assert_eq!(catalog.tracked_locks().await, 0);

        catalog.describe("b").await.expect("describe");
        catalog.drop("b").await.expect("drop");
        assert_eq!(catalog.tracked_locks().await, 0);
    }

    #[tokio::test]
    async fn ungated_mutation_reaches_disabled_table() {
        let dir = TempDir::new().expect("tempdir");
        let catalog = open_catalog(&dir).await;
        catalog.create("t", &families(&["cf"]), 1).await.expect("create");
        let table = catalog.table("t").await.expect("table");
        table.disable().await.expect("disable");

        table
            .mutate_ungated(|unit, _| {
                unit.metadata.disabled = false;
                Ok(())
            })
            .await
            .expect("mutate_ungated");
        assert!(table.is_enabled().await.expect("is_enabled"));
    }

    #[tokio::test]
    async fn mutate_is_gated_and_atomic() {
        let dir = TempDir::new().expect("tempdir");
        let catalog = open_catalog(&dir).await;
        catalog.create("t", &families(&["cf"]), 1).await.expect("create");
        let table = catalog.table("t").await.expect("table");

        let err = table
            .mutate(|unit, _| {
                unit.data.insert_row("r1");
                unit.metadata.row_count += 1;
                Err::<(), _>(cellar_core::CellarError::InvalidArgument("abort".into()))
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(table.describe().await.expect("describe").row_count, 0);

        table.disable().await.expect("disable");
        let err = table.mutate(|_, _| Ok(())).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TableDisabled);
    }

    #[tokio::test]
    async fn encrypted_units_reload_with_key_only() {
        let dir = TempDir::new().expect("tempdir");
        let data_dir = dir.path().join("data").to_string_lossy().to_string();
        let mut options = StoreOptions::new(data_dir.clone());
        options.encryption_key = Some(vec![7u8; 32]);

        let catalog = Catalog::open(options.clone()).await.expect("open");
        catalog.create("secret", &families(&["cf"]), 2).await.expect("create");
        drop(catalog);

        let reopened = Catalog::open(options).await.expect("reopen");
        let meta = reopened.describe("secret").await.expect("describe");
        assert_eq!(meta.max_versions, 2);

        let plain = Catalog::open(StoreOptions::new(data_dir)).await.expect("open plain");
        let err = plain.describe("secret").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
    }

    #[tokio::test]
    async fn open_sweeps_interrupted_writes() {
        let dir = TempDir::new().expect("tempdir");
        let data_dir = dir.path().join("data");
        std::fs::create_dir_all(&data_dir).expect("data dir");
        std::fs::write(data_dir.join("t.tbl.tmp"), b"partial").expect("write tmp");

        let catalog = open_catalog(&dir).await;
        assert!(catalog.list().await.expect("list").is_empty());
        assert!(!data_dir.join("t.tbl.tmp").exists());
    }

    #[tokio::test]
    async fn names_are_normalized_on_every_lookup() {
        let dir = TempDir::new().expect("tempdir");
        let catalog = open_catalog(&dir).await;
        catalog.create(" web users ", &families(&["cf"]), 1).await.expect("create");
        assert_eq!(catalog.list().await.expect("list"), vec!["web_users"]);
        assert!(catalog.exists("web users").await.expect("exists"));
        assert!(!catalog.exists("../web_users").await.expect("exists"));
        let err = catalog.describe("no/such").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
