use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context};
use replytree_api::{Api, CommentId, ProductId};
use replytree_client::{
    deep_link_target, CommentEntry, EligibilityState, Notice, Outcome, ReviewList, Session,
    SystemClock, ThreadConfig, ToastKind,
};
use replytree_mock_server::{Fixture, MockServer};

mod http;

#[derive(structopt::StructOpt)]
struct Opt {
    /// Backend to talk to, eg. http://localhost:8080
    #[structopt(long, required_unless = "fixture")]
    host: Option<String>,

    /// Serve everything from a JSON fixture instead of a backend
    #[structopt(long, conflicts_with = "host", parse(from_os_str))]
    fixture: Option<PathBuf>,

    /// Acting user, anonymous if unset
    #[structopt(long, env = "REPLYTREE_USER")]
    user: Option<String>,

    #[structopt(long)]
    product: i64,

    #[structopt(long, default_value = "5")]
    review_page_size: u32,

    #[structopt(long, default_value = "5")]
    reply_page_size: u32,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Print the review thread of the product
    Show {
        /// Review page to show
        #[structopt(long, default_value = "0")]
        page: u32,

        /// Comment to open the thread at
        #[structopt(long)]
        reply_id: Option<CommentId>,

        /// Query string of a product page link, eg. `?replyId=13`
        #[structopt(long)]
        link: Option<String>,

        /// Comments whose replies should be opened
        #[structopt(long)]
        expand: Vec<CommentId>,
    },

    /// Reply to a comment
    Reply { comment: CommentId, text: String },

    /// Replace the text of a comment
    Edit { comment: CommentId, text: String },

    /// Delete a comment along with all its replies
    Delete { comment: CommentId },

    /// Review the product
    Review { rating: u8, content: Option<String> },
}

fn load_api(opt: &Opt) -> anyhow::Result<Arc<dyn Api>> {
    match (&opt.host, &opt.fixture) {
        (_, Some(path)) => {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("reading fixture {path:?}"))?;
            let fixture = Fixture::from_json(&data)
                .with_context(|| format!("parsing fixture {path:?}"))?;
            Ok(Arc::new(MockServer::from_fixture(fixture)))
        }
        (Some(host), None) => Ok(Arc::new(http::HttpApi::new(host.clone()))),
        (None, None) => Err(anyhow!("one of --host or --fixture is required")),
    }
}

/// Open the thread with `comment` expanded into view
async fn open_at(list: &mut ReviewList, comment: CommentId) -> anyhow::Result<()> {
    list.open(Some(comment)).await;
    report(list);
    if list.entry(comment).is_none() {
        return Err(anyhow!(
            "comment {comment} could not be reached from the first page of reviews"
        ));
    }
    Ok(())
}

fn report(list: &mut ReviewList) {
    for n in list.take_notices() {
        match n {
            Notice::Toast {
                kind: ToastKind::Success,
                message,
            } => println!("{message}"),
            Notice::Toast {
                kind: ToastKind::Error,
                message,
            } => eprintln!("error: {message}"),
            Notice::Alert(message) => eprintln!("!! {message}"),
        }
    }
}

fn print_entry(depth: usize, e: &CommentEntry, highlighted: bool) {
    let c = e.comment();
    let indent = "    ".repeat(depth);
    let rating = c
        .rating
        .map(|r| {
            let r = r as usize;
            format!(" [{}{}]", "*".repeat(r), "-".repeat(5usize.saturating_sub(r)))
        })
        .unwrap_or_default();
    let mark = if highlighted { " <==" } else { "" };
    println!(
        "{indent}#{} {} ({}){rating}{mark}",
        c.id,
        c.author_display_name,
        c.created_at.format("%Y-%m-%d %H:%M"),
    );
    for line in c.content().lines() {
        println!("{indent}  {line}");
    }
}

fn print_list(list: &ReviewList) {
    match list.eligibility() {
        EligibilityState::Eligible(_) => println!("(you can review this product)"),
        EligibilityState::Ineligible(reason) => println!("({})", reason.message()),
        EligibilityState::Loading => (),
    }
    println!(
        "product {}, review page {}/{}",
        list.product(),
        list.page() + 1,
        std::cmp::max(list.total_pages(), 1)
    );
    for (depth, e) in list.visible_entries() {
        print_entry(depth, e, list.is_highlighted(e.id()));
        if let Some(n) = list.node(e.id()) {
            if n.is_expanded() && n.children().has_more() {
                println!("{}  ...", "    ".repeat(depth + 1));
            }
        }
    }
}

fn check(outcome: Outcome, what: &str) -> anyhow::Result<()> {
    match outcome {
        Outcome::Done => Ok(()),
        Outcome::Skipped => Err(anyhow!("{what} was not sent")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let opt = <Opt as structopt::StructOpt>::from_args();

    let api = load_api(&opt)?;
    let config = ThreadConfig {
        review_page_size: opt.review_page_size,
        reply_page_size: opt.reply_page_size,
        ..ThreadConfig::default()
    };
    let session = Session {
        username: opt.user.clone(),
    };
    let mut list = ReviewList::new(
        api,
        Arc::new(SystemClock),
        config,
        session,
        ProductId(opt.product),
    );

    match opt.cmd {
        Command::Show {
            page,
            reply_id,
            link,
            expand,
        } => {
            let target = reply_id.or_else(|| link.as_deref().and_then(deep_link_target));
            list.open(target).await;
            if page != 0 {
                list.go_to_page(page).await;
            }
            for id in expand {
                list.toggle_replies(id).await;
            }
            if let Some(id) = list.take_scroll_request() {
                tracing::debug!(comment = %id, "deep link target is displayed");
            }
            report(&mut list);
            print_list(&list);
        }
        Command::Reply { comment, text } => {
            open_at(&mut list, comment).await?;
            list.set_reply_text(comment, &text);
            let outcome = list.submit_reply(comment).await;
            report(&mut list);
            check(outcome, "reply")?;
        }
        Command::Edit { comment, text } => {
            open_at(&mut list, comment).await?;
            list.start_edit(comment);
            list.set_edit_text(comment, &text);
            let outcome = list.submit_edit(comment).await;
            report(&mut list);
            check(outcome, "edit")?;
        }
        Command::Delete { comment } => {
            open_at(&mut list, comment).await?;
            list.request_delete(comment);
            let outcome = list.confirm_delete(comment).await;
            report(&mut list);
            check(outcome, "deletion")?;
        }
        Command::Review { rating, content } => {
            list.open(None).await;
            if let EligibilityState::Ineligible(reason) = list.eligibility() {
                return Err(anyhow!("{}", reason.message()));
            }
            list.set_review_rating(rating);
            list.set_review_content(content.as_deref().unwrap_or(""));
            let outcome = list.submit_review().await;
            report(&mut list);
            check(outcome, "review")?;
        }
    }

    Ok(())
}
