use chrono::Utc;

use crate::app::{AppContext, Result};
use crate::refresh;

pub async fn reading(ctx: &AppContext) -> Result<()> {
    let records = ctx.client.fetch_currently_reading().await;

    if records.is_empty() {
        println!("No books in progress");
    } else {
        for record in &records {
            let pages = if record.total_pages > 0 {
                format!(
                    "p. {}/{} ({:.0}%)",
                    record.current_page,
                    record.total_pages,
                    record.progress * 100.0
                )
            } else {
                format!("p. {}", record.current_page)
            };
            let cover = if record.cover.is_some() { "" } else { " [no cover]" };
            println!("{} - {} ({}){}", record.title, record.author, pages, cover);
        }
    }

    let interval = refresh::suggest(ctx.settings.is_authenticated(), !records.is_empty());
    println!("Suggested refresh: {}m", interval.duration().as_secs() / 60);
    Ok(())
}

pub async fn goals(ctx: &AppContext) -> Result<()> {
    let goals = ctx.client.fetch_reading_goals().await;
    if goals.is_empty() {
        println!("No reading goals");
        return Ok(());
    }

    for goal in goals {
        let label = goal
            .description
            .clone()
            .unwrap_or_else(|| format!("{} {}s", goal.goal, goal.metric));
        println!(
            "{}: {}/{} ({:.0}%), {} to {}",
            label,
            goal.progress,
            goal.goal,
            goal.percent_complete * 100.0,
            goal.start_date,
            goal.end_date
        );
    }
    Ok(())
}

pub async fn upcoming(ctx: &AppContext, limit: usize) -> Result<()> {
    let releases = ctx.client.fetch_upcoming_releases(limit).await;
    if releases.is_empty() {
        println!("No upcoming releases");
        return Ok(());
    }

    let today = Utc::now().date_naive();
    for release in releases {
        let days = (release.release_date - today).num_days();
        let when = if days <= 0 {
            "today".to_string()
        } else {
            format!("in {} days", days)
        };
        println!(
            "{}  {} - {} ({})",
            release.release_date, release.title, release.author, when
        );
    }
    Ok(())
}

pub async fn history(ctx: &AppContext, limit: i64, offset: i64) -> Result<()> {
    let entries = ctx.client.fetch_reading_history(limit, offset).await;
    if entries.is_empty() {
        println!("No finished books");
        return Ok(());
    }

    for entry in entries {
        let rating = entry
            .rating
            .map(|r| format!("  {:.1}*", r))
            .unwrap_or_default();
        println!("{}  {} - {}{}", entry.finished_at, entry.title, entry.author, rating);
    }
    Ok(())
}

pub async fn stats(ctx: &AppContext, year: Option<i32>) -> Result<()> {
    match ctx.client.fetch_reading_stats(year).await {
        Some(stats) => {
            println!("Books finished: {}", stats.books_finished);
            println!("Estimated pages: {}", stats.estimated_pages);
            match stats.average_rating {
                Some(avg) => println!("Average rating: {:.2}", avg),
                None => println!("Average rating: n/a"),
            }
        }
        None => println!("No stats available"),
    }
    Ok(())
}

pub async fn search(ctx: &AppContext, title: &str, author: Option<&str>, page: i64) -> Result<()> {
    let books = ctx.client.search_books(title, author, page).await;
    if books.is_empty() {
        println!("No matches");
        return Ok(());
    }

    for book in books {
        let author = book.primary_author().unwrap_or("Unknown Author");
        println!("{:>8}  {} - {}", book.id, book.title, author);
    }
    Ok(())
}

pub async fn editions(ctx: &AppContext, book_id: i64) -> Result<()> {
    let editions = ctx.client.fetch_editions(book_id).await;
    if editions.is_empty() {
        println!("No editions found");
        return Ok(());
    }

    for edition in editions {
        let info = edition.display_info();
        if info.is_empty() {
            println!("{:>8}  {}", edition.id, edition.display_title());
        } else {
            println!("{:>8}  {} ({})", edition.id, edition.display_title(), info);
        }
    }
    Ok(())
}

pub async fn whoami(ctx: &AppContext) -> Result<()> {
    match ctx.client.fetch_me().await {
        Some(me) => println!("{} (id {})", me.username, me.id),
        None => println!("Not signed in"),
    }
    Ok(())
}

/// Shared result reporting for the write commands.
pub fn report(action: &str, ok: bool) {
    if ok {
        println!("{}: done", action);
    } else {
        println!("{}: failed", action);
    }
}
