//! Administrative batch-maintenance commands for a commerce catalog
//! database: category/attribute-set reassignment, orphaned super-attribute
//! cleanup, stored-text normalization and transactional notifications.

use catalog_maint::config::AppConfig;
use catalog_maint::error::Result;
use catalog_maint::ops;
use catalog_maint::ops::transactional_email::{EmailDispatcher, SalesEntityKind};
use catalog_maint::ops::{parse_id_list, parse_search_replace, TableColumnFilter};
use catalog_maint::store::{StorePool, TableResolver};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "catalog-maint")]
#[command(version = "0.1.0")]
#[command(about = "Batch maintenance utilities for a relational commerce catalog")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database URL (mysql://... or sqlite:...); falls back to DATABASE_URL
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Physical table-name prefix; falls back to TABLE_PREFIX
    #[arg(long, global = true)]
    table_prefix: Option<String>,

    /// Installation base directory; falls back to BASE_DIR
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Notification endpoint URL; falls back to MAIL_ENDPOINT
    #[arg(long, global = true)]
    mail_endpoint: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Assign an attribute set to all products under the given categories
    AssignAttributeSetByCategory {
        /// Attribute set ID
        #[arg(short = 'a', long)]
        attribute_set_id: i64,

        /// Category ID(s), comma-separated
        #[arg(short = 'c', long)]
        category_id: String,
    },

    /// Assign products carrying an attribute set to target categories
    AssignProductToCategoryByAttributeSet {
        /// Attribute set ID
        #[arg(short = 'a', long)]
        attribute_set_id: i64,

        /// Target category ID(s), comma-separated
        #[arg(short = 'c', long)]
        category_id: String,
    },

    /// Assign products from a source category to target categories
    AssignProductToCategoryByCategory {
        /// Source category ID used to select products
        #[arg(short = 'c', long)]
        category_id_filter: i64,

        /// Target category ID(s), comma-separated
        #[arg(short = 't', long)]
        target_category_id: String,
    },

    /// Remove configurable super attributes with no surviving child values
    CleanupProductSuperAttributes {
        /// Entity ID(s), comma-separated; defaults to all configurable products
        #[arg(short = 'i', long)]
        entity_id: Option<String>,
    },

    /// Convert HTML character references to literal characters
    DecodeHtmlSpecialCharacters {
        /// Target as table:column, e.g. cms_block:content
        #[arg(short = 't', long)]
        table: String,
    },

    /// Rewrite {{store url=...}} directives to direct URLs
    FixStoreUrlParameters {
        /// Target as table:column, e.g. cms_block:content
        #[arg(short = 't', long)]
        table: String,
    },

    /// Replace a literal string in a table column
    ReplaceStringInDatabase {
        /// Target as table:column, e.g. cms_block:content
        #[arg(short = 't', long)]
        table: String,

        /// Search and replacement separated by three colons, e.g. find:::replace
        #[arg(short = 's', long)]
        string: String,

        /// Number of trailing characters to drop after replacement
        #[arg(short = 'u', long, default_value_t = 0)]
        subtract: usize,
    },

    /// Strip leading/trailing whitespace from a table column
    TrimWhitespace {
        /// Database table name
        #[arg(short = 't', long)]
        table: String,

        /// Database table column
        #[arg(short = 'c', long)]
        column: String,
    },

    /// Send transactional email notifications for sales documents
    SendTransactionalEmail {
        /// Document type: order, invoice, shipment or creditmemo
        #[arg(short = 't', long = "type")]
        type_id: String,

        /// Entity ID(s), comma-separated
        #[arg(short = 'i', long)]
        id: String,
    },

    /// Clear generated static view files
    CleanStaticViewFiles,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = AppConfig::from_sources(
        cli.database_url.clone(),
        cli.table_prefix.clone(),
        cli.base_dir.clone(),
        cli.mail_endpoint.clone(),
    );

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: &AppConfig) -> Result<()> {
    let resolver = TableResolver::new(config.table_prefix.clone());

    match command {
        Commands::AssignAttributeSetByCategory {
            attribute_set_id,
            category_id,
        } => {
            let category_ids = parse_id_list(&category_id)?;
            let pool = connect(config).await?;
            let affected = ops::assign_attribute_set::assign_attribute_set_by_category(
                &pool,
                &resolver,
                attribute_set_id,
                &category_ids,
            )
            .await?;
            if affected > 0 {
                println!(
                    "A total of {} products have been assigned to the attribute set with ID: {}.",
                    affected, attribute_set_id
                );
            } else {
                println!(
                    "Nothing to assign to the attribute set with ID: {}...",
                    attribute_set_id
                );
            }
        }

        Commands::AssignProductToCategoryByAttributeSet {
            attribute_set_id,
            category_id,
        } => {
            let target_ids = parse_id_list(&category_id)?;
            let pool = connect(config).await?;
            let product_ids = ops::assign_category::product_ids_by_attribute_set(
                &pool,
                &resolver,
                attribute_set_id,
            )
            .await?;
            let report = ops::assign_category::assign_products_to_categories(
                &pool,
                &resolver,
                &product_ids,
                &target_ids,
            )
            .await?;
            print_assignment_report(&report);
        }

        Commands::AssignProductToCategoryByCategory {
            category_id_filter,
            target_category_id,
        } => {
            let target_ids = parse_id_list(&target_category_id)?;
            let pool = connect(config).await?;
            let product_ids = ops::assign_category::product_ids_by_category(
                &pool,
                &resolver,
                category_id_filter,
            )
            .await?;
            let report = ops::assign_category::assign_products_to_categories(
                &pool,
                &resolver,
                &product_ids,
                &target_ids,
            )
            .await?;
            print_assignment_report(&report);
        }

        Commands::CleanupProductSuperAttributes { entity_id } => {
            let product_ids = match entity_id {
                Some(raw) => Some(parse_id_list(&raw)?),
                None => None,
            };
            let pool = connect(config).await?;
            let report = ops::cleanup_super_attributes::cleanup_product_super_attributes(
                &pool,
                &resolver,
                product_ids,
            )
            .await?;
            if report.is_noop() {
                println!("Nothing to clean up...");
            } else {
                println!(
                    "A total of {} product super attributes have been cleaned up ({} products failed).",
                    report.processed, report.failed
                );
            }
        }

        Commands::DecodeHtmlSpecialCharacters { table } => {
            let filter = TableColumnFilter::parse(&table)?;
            let pool = connect(config).await?;
            let report =
                ops::text_rewrite::decode_html_special_characters(&pool, &resolver, &filter).await?;
            if report.records > 0 {
                println!("{} records processed.", report.records);
            } else {
                println!("Nothing to process...");
            }
        }

        Commands::FixStoreUrlParameters { table } => {
            let filter = TableColumnFilter::parse(&table)?;
            let pool = connect(config).await?;
            let report =
                ops::text_rewrite::fix_store_url_parameters(&pool, &resolver, &filter).await?;
            if report.affected > 0 {
                println!("{} records have been processed.", report.affected);
            } else {
                println!("Nothing to replace...");
            }
        }

        Commands::ReplaceStringInDatabase {
            table,
            string,
            subtract,
        } => {
            let filter = TableColumnFilter::parse(&table)?;
            let (search, replace) = parse_search_replace(&string)?;
            let pool = connect(config).await?;
            let report = ops::text_rewrite::replace_string_in_database(
                &pool, &resolver, &filter, &search, &replace, subtract,
            )
            .await?;
            if report.affected > 0 {
                println!("String has been replaced for {} records.", report.affected);
            } else {
                println!("Nothing to replace...");
            }
        }

        Commands::TrimWhitespace { table, column } => {
            let pool = connect(config).await?;
            let report =
                ops::text_rewrite::trim_whitespace(&pool, &resolver, &table, &column).await?;
            if report.records > 0 {
                println!(
                    "Whitespaces have been stripped for {} records ({} batches failed).",
                    report.records, report.failed_batches
                );
            } else {
                println!("Nothing to process...");
            }
        }

        Commands::SendTransactionalEmail { type_id, id } => {
            // unknown types abort before any send
            let kind = SalesEntityKind::from_str(&type_id)?;
            let entity_ids = parse_id_list(&id)?;
            let endpoint = config.require_mail_endpoint()?.to_string();
            let pool = connect(config).await?;
            let dispatcher = EmailDispatcher::for_kind(kind, pool, resolver, &endpoint);
            let report = dispatcher.send_all(&entity_ids).await?;
            println!(
                "{} emails sent, {} failed.",
                report.processed, report.failed
            );
        }

        Commands::CleanStaticViewFiles => {
            let base_dir = config.require_base_dir()?;
            ops::clean_static_files::clean_static_view_files(base_dir).await?;
            println!("Static view files have been cleaned up.");
        }
    }

    Ok(())
}

async fn connect(config: &AppConfig) -> Result<StorePool> {
    StorePool::connect(config.require_database_url()?).await
}

fn print_assignment_report(report: &ops::OpReport) {
    if report.is_noop() {
        println!("Nothing to assign...");
    } else {
        println!(
            "{} products processed, {} failed.",
            report.processed, report.failed
        );
    }
}
