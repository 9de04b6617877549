use std::fmt;

use serde::{Deserialize, Serialize};

use super::ApiClient;
use crate::error::Result;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Reviewing,
    Approved,
    Rejected,
    Revised,
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Reviewing => "reviewing",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
            ReviewStatus::Revised => "revised",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InlineComment {
    pub commenter_id: u64,
    #[serde(default)]
    pub commenter_name: Option<String>,
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCaseReview {
    pub id: u64,
    pub test_case_id: u64,
    pub project_id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: ReviewStatus,
    #[serde(default)]
    pub reviewer_ids: Vec<u64>,
    #[serde(default)]
    pub created_by: Option<u64>,
    #[serde(default)]
    pub reviewed_by: Option<u64>,
    #[serde(default)]
    pub review_comments: Vec<InlineComment>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub reviewed_at: Option<String>,
    #[serde(default)]
    pub test_case_name: Option<String>,
    #[serde(default)]
    pub creator_name: Option<String>,
    #[serde(default)]
    pub reviewer_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestCaseReviewCreate {
    pub test_case_id: u64,
    pub project_id: u64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reviewer_ids: Vec<u64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TestCaseReviewUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReviewStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewComment {
    pub id: u64,
    pub review_id: u64,
    pub commenter_id: u64,
    #[serde(default)]
    pub commenter_name: Option<String>,
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewCommentCreate {
    pub content: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReviewQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_case_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReviewStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer_id: Option<u64>,
}

#[derive(Serialize)]
struct CommentParam<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
}

impl ApiClient {
    pub async fn list_reviews(&self, query: &ReviewQuery) -> Result<Vec<TestCaseReview>> {
        self.get_list("/test-case-reviews", "reviews", query).await
    }

    pub async fn get_review(&self, id: u64) -> Result<TestCaseReview> {
        self.get(&format!("/test-case-reviews/{}", id)).await
    }

    pub async fn create_review(&self, data: &TestCaseReviewCreate) -> Result<TestCaseReview> {
        self.post("/test-case-reviews", data).await
    }

    pub async fn update_review(
        &self,
        id: u64,
        data: &TestCaseReviewUpdate,
    ) -> Result<TestCaseReview> {
        self.put(&format!("/test-case-reviews/{}", id), data).await
    }

    pub async fn delete_review(&self, id: u64) -> Result<()> {
        self.delete(&format!("/test-case-reviews/{}", id)).await
    }

    pub async fn review_comments(&self, id: u64) -> Result<Vec<ReviewComment>> {
        self.get_list(&format!("/test-case-reviews/{}/comments", id), "comments", &())
            .await
    }

    pub async fn add_review_comment(
        &self,
        id: u64,
        data: &ReviewCommentCreate,
    ) -> Result<ReviewComment> {
        self.post(&format!("/test-case-reviews/{}/comments", id), data)
            .await
    }

    pub async fn approve_review(&self, id: u64, comment: Option<&str>) -> Result<TestCaseReview> {
        self.post_empty(
            &format!("/test-case-reviews/{}/approve", id),
            &CommentParam { comment },
        )
        .await
    }

    /// Rejecting always carries a reason.
    pub async fn reject_review(&self, id: u64, comment: &str) -> Result<TestCaseReview> {
        self.post_empty(
            &format!("/test-case-reviews/{}/reject", id),
            &CommentParam {
                comment: Some(comment),
            },
        )
        .await
    }
}
