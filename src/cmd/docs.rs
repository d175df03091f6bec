//! Plan document browsing: `office-dash docs`.

use std::sync::Arc;

use anyhow::{Context, Result, bail};

use office_dash::config::{CliOverrides, DashboardConfig};
use office_dash::documents::{DocumentState, DocumentStore, HttpDocumentSource};

use super::super::DocsCommands;

fn store_for(page_url: Option<String>) -> Result<DocumentStore> {
    let config = DashboardConfig::resolve(&CliOverrides {
        page_url,
        ..Default::default()
    })
    .context("Failed to load configuration")?;
    let source = HttpDocumentSource::new(&config.page_url)?;
    Ok(DocumentStore::new(Arc::new(source)))
}

pub async fn cmd_docs(command: DocsCommands) -> Result<()> {
    match command {
        DocsCommands::List { page_url } => {
            let mut store = store_for(page_url)?;
            let documents = store
                .refresh_list()
                .await
                .context("Failed to list documents")?;
            if documents.is_empty() {
                println!("No documents available");
            }
            for doc in documents {
                println!("{:<16} {}", doc.id, doc.label);
            }
        }
        DocsCommands::Show { id, page_url } => {
            let mut store = store_for(page_url)?;
            match store.load(&id).await {
                DocumentState::Loaded(content) => println!("{}", content),
                DocumentState::Failed(message) => {
                    bail!("Failed to load document '{}': {}", id, message)
                }
                DocumentState::Loading => bail!("Document '{}' did not load", id),
            }
        }
    }
    Ok(())
}
