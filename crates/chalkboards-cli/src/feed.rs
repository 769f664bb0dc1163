//! `feed`, `watch` and `categories` command handlers.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use chalkboards_core::categories::ALL_CATEGORIES_KEY;
use chalkboards_core::{AppConfig, CategoryTable, Coordinates, RawRow};
use chalkboards_feed::format::COLLAPSED_CARD_LINES;
use chalkboards_feed::{
    card_lines, distance_text, page, run_pipeline, split_top, EvalClock, FeedQuery,
    RestaurantGroup, TOP_COUNT,
};
use chalkboards_store::{spawn_refresh, SpecialsStore};

use crate::FeedArgs;

/// Turn command-line filters into a pipeline query, falling back to the
/// configured origin and radius.
pub(crate) fn build_query(config: &AppConfig, args: &FeedArgs) -> anyhow::Result<FeedQuery> {
    let origin = match (args.lat, args.lng) {
        (Some(lat), Some(lng)) => Coordinates::new(lat, lng)
            .ok_or_else(|| anyhow::anyhow!("--lat and --lng must be finite numbers"))?,
        _ => config.default_origin,
    };
    Ok(FeedQuery {
        origin,
        radius: args.radius.unwrap_or(config.default_radius),
        search: args.search.clone(),
        category: args.category.clone(),
        mode: args.mode,
    })
}

/// Print `groups` as numbered cards starting at `first`.
pub(crate) fn render_cards(groups: &[RestaurantGroup], first: usize) -> String {
    let mut out = String::new();
    for (i, group) in groups.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>2}. {}  ({})\n    {}",
            first + i,
            group.display_name(),
            distance_text(group.distance_miles),
            group.address
        );

        let lines = card_lines(group);
        for line in lines.iter().take(COLLAPSED_CARD_LINES) {
            let _ = writeln!(out, "    {}  [{}]", line.line, line.sub);
        }
        if lines.len() > COLLAPSED_CARD_LINES {
            let hidden = lines.len() - COLLAPSED_CARD_LINES;
            let _ = writeln!(out, "    … {hidden} more");
        }
    }
    out
}

fn print_feed(groups: &[RestaurantGroup], limit: usize) {
    if groups.is_empty() {
        println!("no specials match right now");
        return;
    }

    let (top, rest) = split_top(groups, TOP_COUNT);
    println!("TOP {}", top.len());
    print!("{}", render_cards(top, 1));

    let window = page(rest, 0, limit);
    if !window.items.is_empty() {
        println!();
        println!("NEARBY");
        print!("{}", render_cards(&window.items, top.len() + 1));
    }
    if window.next_offset.is_some() {
        println!(
            "({} more, raise --limit to see them)",
            rest.len() - window.items.len()
        );
    }
}

fn compute(
    rows: &[RawRow],
    args: &FeedArgs,
    query: &FeedQuery,
    categories: &CategoryTable,
) -> Vec<RestaurantGroup> {
    let requested = args
        .category
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty() && !k.eq_ignore_ascii_case(ALL_CATEGORIES_KEY));
    if let Some(key) = requested {
        if query.resolve_category(categories).is_none() {
            eprintln!("warning: unknown category '{key}', showing everything");
        }
    }
    run_pipeline(rows, &EvalClock::local_now(), query, categories)
}

/// Fetch once and print the feed.
///
/// # Errors
///
/// Returns an error if the store client cannot be built or the fetch fails.
pub(crate) async fn run_feed(
    config: &AppConfig,
    categories: &CategoryTable,
    args: &FeedArgs,
) -> anyhow::Result<()> {
    let query = build_query(config, args)?;
    let store = SpecialsStore::from_config(config)?;
    let rows = store.fetch_recent().await?;
    tracing::info!(rows = rows.len(), "fetched rows");

    let groups = compute(&rows, args, &query, categories);
    print_feed(&groups, args.limit.unwrap_or(config.page_size));
    Ok(())
}

/// Re-print the feed after every refresh until interrupted.
///
/// Fetch failures are printed and the loop keeps going.
///
/// # Errors
///
/// Returns an error if the store client cannot be built.
pub(crate) async fn run_watch(
    config: &AppConfig,
    categories: &CategoryTable,
    args: &FeedArgs,
    interval_secs: Option<u64>,
) -> anyhow::Result<()> {
    let query = build_query(config, args)?;
    let interval = interval_secs
        .unwrap_or(config.refresh_interval_secs)
        .max(1);
    let store = SpecialsStore::from_config(config)?;
    let refresh = spawn_refresh(Arc::new(store), Duration::from_secs(interval));
    let mut rx = refresh.subscribe();
    let limit = args.limit.unwrap_or(config.page_size);

    println!("watching every {interval}s, ctrl-c to stop");
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }

        let snapshot = rx.borrow_and_update().clone();
        println!();
        match (&snapshot.error, snapshot.fetched_at) {
            (Some(e), _) => println!("refresh #{} failed: {e}", snapshot.generation),
            (None, Some(at)) => println!(
                "refresh #{} at {} ({} rows)",
                snapshot.generation,
                at.format("%H:%M:%S"),
                snapshot.rows.len()
            ),
            (None, None) => {}
        }
        let groups = compute(&snapshot.rows, args, &query, categories);
        print_feed(&groups, limit);
    }

    refresh.cancel();
    tracing::info!("watch stopped");
    Ok(())
}

pub(crate) fn print_categories(categories: &CategoryTable) {
    println!("{:<14}LABEL", "KEY");
    println!("{ALL_CATEGORIES_KEY:<14}All");
    for category in &categories.categories {
        println!(
            "{:<14}{} {}",
            category.key, category.emoji, category.label
        );
    }
}
