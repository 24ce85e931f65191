use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::document::BlockCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockGroup {
    Basic,
    Lists,
    Media,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockMenuItem {
    pub id: String,
    pub label: String,
    pub group: BlockGroup,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub command: BlockCommand,
}

impl BlockMenuItem {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        group: BlockGroup,
        command: BlockCommand,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            group,
            keywords: Vec::new(),
            command,
        }
    }

    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Case-insensitive match on label and keywords. An empty query matches everything.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.label.to_lowercase().contains(&query)
            || self
                .keywords
                .iter()
                .any(|k| k.to_lowercase().contains(&query))
    }

    pub fn default_items(include_ai: bool) -> Vec<BlockMenuItem> {
        let mut items = vec![
            heading_item(1),
            heading_item(2),
            heading_item(3),
            heading_item(4),
            BlockMenuItem::new(
                "bulleted_list",
                "Bulleted list",
                BlockGroup::Lists,
                BlockCommand::new("list.toggle_bulleted"),
            )
            .keywords(["ul", "bullet", "unordered"]),
            BlockMenuItem::new(
                "ordered_list",
                "Numbered list",
                BlockGroup::Lists,
                BlockCommand::new("list.toggle_ordered"),
            )
            .keywords(["ol", "numbered", "ordered"]),
            BlockMenuItem::new(
                "blockquote",
                "Quote",
                BlockGroup::Lists,
                BlockCommand::new("blockquote.wrap_selection"),
            )
            .keywords(["blockquote", "citation"]),
            BlockMenuItem::new(
                "code_block",
                "Code block",
                BlockGroup::Basic,
                BlockCommand::new("code_block.toggle"),
            )
            .keywords(["code", "pre", "snippet"]),
            BlockMenuItem::new(
                "image",
                "Image",
                BlockGroup::Media,
                BlockCommand::new("image.insert"),
            )
            .keywords(["picture", "photo", "url"]),
            BlockMenuItem::new(
                "image_upload",
                "Image upload",
                BlockGroup::Media,
                BlockCommand::new("image.insert_uploader"),
            )
            .keywords(["picture", "photo", "upload", "file"]),
            BlockMenuItem::new(
                "table",
                "Table",
                BlockGroup::Media,
                BlockCommand::new("table.insert").args(json!({ "rows": 3, "cols": 3 })),
            )
            .keywords(["grid", "rows", "columns"]),
        ];

        if include_ai {
            items.extend([
                ai_item("ai_text_completion", "Complete Text", "textCompletion"),
                ai_item("ai_grammar_check", "Check Grammar", "grammarCheck"),
                ai_item("ai_style_suggestions", "Style Suggestions", "styleSuggestions"),
                ai_item("ai_content_summary", "Summarize", "contentSummary"),
                ai_item("ai_code_suggestions", "Code Suggestions", "codeSuggestions"),
            ]);
        }
        items
    }
}

fn heading_item(level: u8) -> BlockMenuItem {
    BlockMenuItem::new(
        format!("heading_{level}"),
        format!("Heading {level}"),
        BlockGroup::Basic,
        BlockCommand::new("block.set_heading").args(json!({ "level": level })),
    )
    .keywords([format!("h{level}"), "title".to_string()])
}

fn ai_item(id: &str, label: &str, feature: &str) -> BlockMenuItem {
    BlockMenuItem::new(
        id,
        label,
        BlockGroup::Ai,
        BlockCommand::new("ai.request").args(json!({ "feature": feature })),
    )
    .keywords(["ai", "assistant"])
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionUser {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl MentionUser {
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            avatar: None,
        }
    }

    pub fn avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar = Some(url.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "candidate", rename_all = "snake_case")]
pub enum Candidate {
    Block(BlockMenuItem),
    Mention(MentionUser),
}

impl Candidate {
    pub fn id(&self) -> &str {
        match self {
            Candidate::Block(item) => &item.id,
            Candidate::Mention(user) => &user.id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Candidate::Block(item) => &item.label,
            Candidate::Mention(user) => &user.name,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            Candidate::Block(_) => None,
            Candidate::Mention(user) => Some(&user.email),
        }
    }
}

impl From<BlockMenuItem> for Candidate {
    fn from(value: BlockMenuItem) -> Self {
        Candidate::Block(value)
    }
}

impl From<MentionUser> for Candidate {
    fn from(value: MentionUser) -> Self {
        Candidate::Mention(value)
    }
}
