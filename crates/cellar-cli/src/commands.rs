use anyhow::anyhow;
use cellar_core::{CellRecord, TableMetadata};
use cellar_engine::Database;
use clap::{Parser, Subcommand};

/// Command-line access to a cellar data directory.
#[derive(Debug, Parser)]
#[command(name = "cellar", version)]
pub struct Cli {
    /// TOML config file; built-in defaults are used when omitted.
    #[arg(long)]
    pub config: Option<String>,
    /// Log at debug level regardless of the config file.
    #[arg(long, short)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Create {
        table: String,
        /// Comma separated column families.
        #[arg(long, value_delimiter = ',', required = true)]
        families: Vec<String>,
        #[arg(long, default_value_t = 3)]
        max_versions: u32,
    },
    List,
    Enable {
        table: String,
    },
    Disable {
        table: String,
    },
    IsEnabled {
        table: String,
    },
    /// Rename a disabled table and/or add a column family to it.
    Alter {
        table: String,
        #[arg(long)]
        rename: Option<String>,
        #[arg(long)]
        add_family: Option<String>,
    },
    Drop {
        table: String,
    },
    DropAll,
    Describe {
        table: String,
    },
    /// Write one value; omit --row to append a new row.
    Put {
        table: String,
        family: String,
        column: String,
        value: String,
        #[arg(long)]
        row: Option<String>,
    },
    Get {
        table: String,
        row: String,
    },
    Scan {
        table: String,
    },
    /// Delete every version of one cell.
    Delete {
        table: String,
        row: String,
        family: String,
        column: String,
    },
    DeleteRow {
        table: String,
        row: String,
    },
    Count {
        table: String,
    },
    Truncate {
        table: String,
    },
    /// One new row per value.
    InsertMany {
        table: String,
        family: String,
        column: String,
        values: Vec<String>,
    },
    /// Records as `row,family,column,value`.
    UpdateMany {
        table: String,
        #[arg(required = true)]
        records: Vec<String>,
    },
}

pub async fn run(db: &Database, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Create {
            table,
            families,
            max_versions,
        } => {
            let meta = db.create(&table, &families, max_versions).await?;
            print_metadata(&meta);
        }
        Command::List => {
            for name in db.list_tables().await? {
                println!("{name}");
            }
        }
        Command::Enable { table } => db.enable(&table).await?,
        Command::Disable { table } => db.disable(&table).await?,
        Command::IsEnabled { table } => println!("{}", db.is_enabled(&table).await?),
        Command::Alter {
            table,
            rename,
            add_family,
        } => {
            let meta = db
                .alter(&table, rename.as_deref(), add_family.as_deref())
                .await?;
            print_metadata(&meta);
        }
        Command::Drop { table } => db.drop_table(&table).await?,
        Command::DropAll => {
            let report = db.drop_all().await?;
            for name in &report.succeeded {
                println!("dropped {name}");
            }
            for (name, err) in &report.failed {
                println!("failed {name}: {err}");
            }
            if !report.success() {
                return Err(anyhow!("{} tables could not be dropped", report.failed.len()));
            }
        }
        Command::Describe { table } => print_metadata(&db.describe(&table).await?),
        Command::Put {
            table,
            family,
            column,
            value,
            row,
        } => {
            let key = db
                .put(&table, &family, &column, &value, row.as_deref())
                .await?;
            println!("{key}");
        }
        Command::Get { table, row } => {
            for (family, columns) in db.get(&table, &row).await? {
                for (column, value) in columns {
                    println!("{family}:{column}\t{value}");
                }
            }
        }
        Command::Scan { table } => {
            for (row_key, families) in db.scan(&table).await? {
                for (family, columns) in families {
                    for (column, history) in columns {
                        for (ts, value) in history {
                            println!("{row_key}\t{family}:{column}\t{ts}\t{value}");
                        }
                    }
                }
            }
        }
        Command::Delete {
            table,
            row,
            family,
            column,
        } => db.delete(&table, &row, &family, &column).await?,
        Command::DeleteRow { table, row } => db.delete_row(&table, &row).await?,
        Command::Count { table } => println!("{}", db.count(&table).await?),
        Command::Truncate { table } => {
            let report = db.truncate(&table).await?;
            println!("{} rows deleted in {:?}", report.rows_deleted, report.elapsed);
        }
        Command::InsertMany {
            table,
            family,
            column,
            values,
        } => {
            let batch = db.insert_many(&table, &family, &column, &values).await?;
            for cell in &batch.generated_cells {
                println!("{}\t{}", cell.row_key, cell.value);
            }
            println!("{} rows in {:?}", batch.count, batch.elapsed);
        }
        Command::UpdateMany { table, records } => {
            let records = records
                .iter()
                .map(|raw| parse_record(raw))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let batch = db.update_many(&table, &records).await?;
            println!("{} cells in {:?}", batch.count, batch.elapsed);
        }
    }
    Ok(())
}

fn parse_record(raw: &str) -> anyhow::Result<CellRecord> {
    let mut parts = raw.splitn(4, ',');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(row_key), Some(family), Some(column), Some(value)) => Ok(CellRecord {
            row_key: row_key.trim().to_string(),
            column_family: family.trim().to_string(),
            column: column.trim().to_string(),
            value: value.to_string(),
        }),
        _ => Err(anyhow!("expected row,family,column,value but got {raw:?}")),
    }
}

fn print_metadata(meta: &TableMetadata) {
    println!("table_name:      {}", meta.table_name);
    println!("table_id:        {}", meta.table_id);
    println!("column_families: {}", meta.column_families.join(", "));
    println!("disabled:        {}", meta.disabled);
    println!("created_at:      {}", meta.created_at);
    println!("updated_at:      {}", meta.updated_at);
    println!("row_count:       {}", meta.row_count);
    println!("max_versions:    {}", meta.max_versions);
}
