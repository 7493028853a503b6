#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct ProductId(pub i64);

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(transparent)]
pub struct OrderId(pub i64);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum IneligibleReason {
    NotLoggedIn,
    NoCompletedPurchase,
    AlreadyReviewed,
}

impl IneligibleReason {
    pub fn message(&self) -> &'static str {
        match self {
            IneligibleReason::NotLoggedIn => "Log in to review this product",
            IneligibleReason::NoCompletedPurchase => {
                "Only customers with a completed order can review this product"
            }
            IneligibleReason::AlreadyReviewed => "You already reviewed this product",
        }
    }
}

/// Whether the current user may post a review for a product
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Eligibility {
    #[serde(rename_all = "camelCase")]
    Eligible { order_id: OrderId },
    Ineligible { reason: IneligibleReason },
}
