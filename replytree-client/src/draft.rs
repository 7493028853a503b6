/// Reply being composed. The `@author` tag is kept apart from the body so
/// that an otherwise empty reply can be told apart.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReplyDraft {
    tag: String,
    body: String,
}

impl ReplyDraft {
    pub fn for_author(author: &str) -> ReplyDraft {
        ReplyDraft {
            tag: format!("@{author} "),
            body: String::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Accepts either the bare body or the full text with the tag in front.
    /// The tag only counts as such when it is a whole word.
    pub fn set_text(&mut self, text: &str) {
        let tag = self.tag.trim_end();
        let body = match text.strip_prefix(tag) {
            Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest,
            _ => text,
        };
        self.body = String::from(body);
    }

    /// What gets posted, or None if there is nothing besides the tag
    pub fn submission(&self) -> Option<String> {
        let body = self.body.trim();
        match body.is_empty() {
            true => None,
            false => Some(format!("{}{}", self.tag, body)),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EditDraft {
    pub text: String,
}

impl EditDraft {
    pub fn submission(&self) -> Option<String> {
        let text = self.text.trim();
        match text.is_empty() {
            true => None,
            false => Some(String::from(text)),
        }
    }
}

/// Review being composed at the top of the list
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ReviewDraft {
    /// 0 until the user picks a star
    pub rating: u8,
    pub content: String,
}

impl ReviewDraft {
    pub fn content(&self) -> Option<String> {
        let content = self.content.trim();
        match content.is_empty() {
            true => None,
            false => Some(String::from(content)),
        }
    }
}
