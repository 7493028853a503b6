use async_trait::async_trait;
use replytree_api::{
    Api, Comment, CommentId, EditComment, Eligibility, Error, NewReply, NewReview, Page,
    ProductId,
};

/// `Api` over the JSON REST endpoints of a running backend
pub struct HttpApi {
    host: String,
    client: reqwest::Client,
}

impl HttpApi {
    pub fn new(host: String) -> HttpApi {
        HttpApi {
            host: String::from(host.trim_end_matches('/')),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.host, path)
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, Error> {
        let resp = req.send().await.map_err(transport)?;
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp.bytes().await.map_err(transport)?;
        Err(Error::parse(&body).unwrap_or_else(|err| {
            tracing::warn!(?err, %status, "failed parsing error returned by server");
            Error::Unknown(format!("server answered {status}"))
        }))
    }

    async fn fetch<R>(&self, req: reqwest::RequestBuilder) -> Result<R, Error>
    where
        R: for<'de> serde::Deserialize<'de>,
    {
        self.send(req).await?.json().await.map_err(transport)
    }

    async fn fetch_page(&self, path: &str, page: u32, size: u32) -> Result<Page<Comment>, Error> {
        self.fetch(
            self.client
                .get(self.url(path))
                .query(&[("page", page), ("size", size)]),
        )
        .await
    }
}

fn transport(err: reqwest::Error) -> Error {
    Error::Transport(err.to_string())
}

#[async_trait]
impl Api for HttpApi {
    async fn fetch_reviews(
        &self,
        product: ProductId,
        page: u32,
        size: u32,
    ) -> Result<Page<Comment>, Error> {
        self.fetch_page(&format!("products/{product}/reviews"), page, size)
            .await
    }

    async fn fetch_replies(
        &self,
        parent: CommentId,
        page: u32,
        size: u32,
    ) -> Result<Page<Comment>, Error> {
        self.fetch_page(&format!("comments/{parent}/replies"), page, size)
            .await
    }

    async fn fetch_descendants(
        &self,
        parent: CommentId,
        page: u32,
        size: u32,
    ) -> Result<Page<Comment>, Error> {
        self.fetch_page(&format!("comments/{parent}/descendants"), page, size)
            .await
    }

    async fn fetch_ancestors(&self, comment: CommentId) -> Result<Vec<CommentId>, Error> {
        self.fetch(
            self.client
                .get(self.url(&format!("comments/{comment}/ancestors"))),
        )
        .await
    }

    async fn post_reply(&self, reply: NewReply, username: &str) -> Result<Comment, Error> {
        reply.validate()?;
        self.fetch(
            self.client
                .post(self.url("comments/reply"))
                .query(&[("username", username)])
                .json(&reply),
        )
        .await
    }

    async fn edit_comment(
        &self,
        comment: CommentId,
        edit: EditComment,
        username: &str,
    ) -> Result<(), Error> {
        edit.validate()?;
        self.send(
            self.client
                .put(self.url(&format!("comments/{comment}")))
                .query(&[("username", username)])
                .json(&edit),
        )
        .await?;
        Ok(())
    }

    async fn delete_comment(&self, comment: CommentId, username: &str) -> Result<(), Error> {
        self.send(
            self.client
                .delete(self.url(&format!("comments/{comment}")))
                .query(&[("username", username)]),
        )
        .await?;
        Ok(())
    }

    async fn review_eligibility(
        &self,
        product: ProductId,
        username: &str,
    ) -> Result<Eligibility, Error> {
        self.fetch(
            self.client
                .get(self.url(&format!("products/{product}/review-eligibility")))
                .query(&[("username", username)]),
        )
        .await
    }

    async fn post_review(&self, review: NewReview, username: &str) -> Result<Comment, Error> {
        review.validate()?;
        self.fetch(
            self.client
                .post(self.url(&format!("products/{}/reviews", review.product_id)))
                .query(&[("username", username)])
                .json(&review),
        )
        .await
    }
}
