use chrono::{Duration, TimeZone, Utc};
use rand::{seq::SliceRandom, Rng};
use replytree_api::{Comment, CommentId, OrderId, ProductId};
use replytree_mock_server::{Fixture, Order, User};

const NUM_USERS: usize = 8;
const NUM_PRODUCTS: i64 = 3;
const NUM_ORDERS: usize = 20;

const NUM_REVIEWS: usize = 25;
const NUM_REPLIES: usize = 150;
const COMMENT_WORD_COUNT: usize = 25;

// Replies pick their parent among the most recent comments of a product, so
// that some threads get deep enough to be flattened
const RECENT_PARENTS: usize = 6;

fn gen_text(rng: &mut impl Rng) -> String {
    lipsum::lipsum_words(rng.gen_range(3..COMMENT_WORD_COUNT))
}

fn main() {
    let mut rng = rand::thread_rng();
    let start = Utc
        .timestamp_opt(1_650_000_000, 0)
        .single()
        .expect("start date is valid");
    let mut now = start;
    let mut tick = |rng: &mut rand::rngs::ThreadRng| {
        now = now + Duration::minutes(rng.gen_range(1..600));
        now
    };

    // Generate users
    let users = (0..NUM_USERS)
        .map(|i| User {
            name: format!("{}{i}", lipsum::lipsum_words(1).to_lowercase().trim_matches('.')),
            image_url: rng
                .gen_bool(0.5)
                .then(|| format!("https://example.org/avatars/{i}.png")),
        })
        .collect::<Vec<_>>();

    let products = (1..=NUM_PRODUCTS).map(ProductId).collect::<Vec<_>>();

    // Generate orders, completed ones are the only ones allowing a review
    let orders = (0..NUM_ORDERS)
        .map(|i| Order {
            id: OrderId(i as i64 + 1),
            username: users.choose(&mut rng).expect("users exist").name.clone(),
            product: *products.choose(&mut rng).expect("products exist"),
            completed: rng.gen_bool(0.7),
        })
        .collect::<Vec<_>>();

    // Generate reviews, at most one per user and product
    let mut comments: Vec<Comment> = Vec::new();
    let mut next_id = 1;
    for o in orders.iter().filter(|o| o.completed).take(NUM_REVIEWS) {
        let already = comments.iter().any(|c| {
            c.product_id == o.product && c.author_display_name == o.username
        });
        if already {
            continue;
        }
        comments.push(Comment {
            id: CommentId(next_id),
            author_display_name: o.username.clone(),
            author_image_url: users
                .iter()
                .find(|u| u.name == o.username)
                .and_then(|u| u.image_url.clone()),
            content: rng.gen_bool(0.8).then(|| gen_text(&mut rng)),
            created_at: tick(&mut rng),
            parent_id: None,
            product_id: o.product,
            rating: Some(rng.gen_range(1..=5)),
        });
        next_id += 1;
    }

    // Generate replies
    for _ in 0..NUM_REPLIES {
        if comments.is_empty() {
            break;
        }
        let product = comments.choose(&mut rng).expect("comments exist").product_id;
        let candidates = comments
            .iter()
            .filter(|c| c.product_id == product)
            .rev()
            .take(RECENT_PARENTS)
            .collect::<Vec<_>>();
        let parent = *candidates.choose(&mut rng).expect("product has comments");
        let author = users.choose(&mut rng).expect("users exist");
        let reply = Comment {
            id: CommentId(next_id),
            author_display_name: author.name.clone(),
            author_image_url: author.image_url.clone(),
            content: Some(format!(
                "@{} {}",
                parent.author_display_name,
                gen_text(&mut rng)
            )),
            created_at: tick(&mut rng),
            parent_id: Some(parent.id),
            product_id: product,
            rating: None,
        };
        comments.push(reply);
        next_id += 1;
    }

    let fixture = Fixture {
        users,
        products,
        orders,
        comments,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&fixture).expect("serializing fixture")
    );
}
