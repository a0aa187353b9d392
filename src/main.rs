use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pageturn::app::AppContext;
use pageturn::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let ctx = match &cli.config {
        Some(path) => AppContext::from_config_file(path)?,
        None => AppContext::new()?,
    };

    match cli.command {
        Commands::Reading => {
            commands::reading(&ctx).await?;
        }
        Commands::Goals => {
            commands::goals(&ctx).await?;
        }
        Commands::Upcoming { limit } => {
            commands::upcoming(&ctx, limit).await?;
        }
        Commands::History { limit, offset } => {
            commands::history(&ctx, limit, offset).await?;
        }
        Commands::Stats { year } => {
            commands::stats(&ctx, year).await?;
        }
        Commands::Search { title, author, page } => {
            commands::search(&ctx, &title, author.as_deref(), page).await?;
        }
        Commands::Editions { book_id } => {
            commands::editions(&ctx, book_id).await?;
        }
        Commands::Whoami => {
            commands::whoami(&ctx).await?;
        }
        Commands::Add { book_id, edition } => {
            let ok = ctx.client.add_book(book_id, edition).await;
            commands::report("add", ok);
        }
        Commands::SetEdition {
            user_book_id,
            edition_id,
        } => {
            let ok = ctx.client.update_edition(user_book_id, edition_id).await;
            commands::report("set-edition", ok);
        }
        Commands::Log {
            user_book_id,
            page,
            edition,
        } => {
            let ok = ctx.client.insert_read(user_book_id, page, edition).await;
            commands::report("log", ok);
        }
        Commands::Status {
            user_book_id,
            status_id,
        } => {
            let ok = ctx.client.update_status(user_book_id, status_id).await;
            commands::report("status", ok);
        }
        Commands::Rate {
            user_book_id,
            rating,
        } => {
            let ok = ctx.client.update_rating(user_book_id, rating).await;
            commands::report("rate", ok);
        }
        Commands::Finish {
            user_book_id,
            edition,
            total_pages,
            current_page,
            rating,
        } => {
            let ok = ctx
                .client
                .finish_book(user_book_id, edition, total_pages, current_page, rating)
                .await;
            commands::report("finish", ok);
        }
        Commands::Delete { user_book_id } => {
            let ok = ctx.client.delete_book(user_book_id).await;
            commands::report("delete", ok);
        }
    }

    Ok(())
}
