/// One page of a paginated listing, as returned by the server
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,

    /// Only filled in for top-level review listings
    #[serde(default)]
    pub total_pages: u32,

    /// Whether this is the last page, ie. there is nothing more to load
    pub last: bool,
}

impl<T> Page<T> {
    /// Cut page number `page` of size `size` out of the full listing `all`
    pub fn slice(all: &[T], page: u32, size: u32) -> Page<T>
    where
        T: Clone,
    {
        let size = std::cmp::max(size, 1) as usize;
        let start = (page as usize).saturating_mul(size);
        let end = std::cmp::min(start.saturating_add(size), all.len());
        let content = all.get(start..end).map(|s| s.to_vec()).unwrap_or_default();
        let total_pages = ((all.len() + size - 1) / size) as u32;
        Page {
            content,
            total_pages,
            last: end >= all.len(),
        }
    }
}
