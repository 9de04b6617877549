use colored::Colorize;

use super::{confirm, Context};
use crate::api::{
    ReviewCommentCreate, ReviewQuery, TestCaseReview, TestCaseReviewCreate, TestCaseReviewUpdate,
};
use crate::cli::{Cli, ReviewCommands};
use crate::error::{QgError, Result};
use crate::output::{self, Table};

pub async fn run(cli: &Cli, command: &ReviewCommands) -> Result<()> {
    let ctx = Context::new(cli)?;
    match command {
        ReviewCommands::List {
            project,
            test_case,
            status,
            reviewer,
        } => {
            let query = ReviewQuery {
                project_id: *project,
                test_case_id: *test_case,
                status: *status,
                reviewer_id: *reviewer,
            };
            list(&ctx, &query).await
        }
        ReviewCommands::Get { id } => get(&ctx, *id).await,
        ReviewCommands::Create {
            test_case,
            project,
            title,
            description,
            reviewers,
        } => {
            let data = TestCaseReviewCreate {
                test_case_id: *test_case,
                project_id: *project,
                title: title.clone(),
                description: description.clone(),
                reviewer_ids: reviewers.clone(),
            };
            let review = ctx.client.create_review(&data).await?;
            report(&ctx, &review, "Requested review")
        }
        ReviewCommands::Status { id, status } => {
            let data = TestCaseReviewUpdate {
                status: Some(*status),
                ..Default::default()
            };
            let review = ctx.client.update_review(*id, &data).await?;
            report(&ctx, &review, "Updated review")
        }
        ReviewCommands::Approve { id, comment } => {
            let review = ctx.client.approve_review(*id, comment.as_deref()).await?;
            report(&ctx, &review, "Approved review")
        }
        ReviewCommands::Reject { id, comment } => {
            if comment.trim().is_empty() {
                return Err(QgError::InvalidInput(
                    "a rejection needs a --comment explaining why".into(),
                ));
            }
            let review = ctx.client.reject_review(*id, comment).await?;
            report(&ctx, &review, "Rejected review")
        }
        ReviewCommands::Comment { id, content } => {
            let comment = ctx
                .client
                .add_review_comment(
                    *id,
                    &ReviewCommentCreate {
                        content: content.clone(),
                        kind: None,
                    },
                )
                .await?;
            if ctx.json {
                return output::print_json(&comment);
            }
            output::success(&format!("Added comment {} to review {}", comment.id, id));
            Ok(())
        }
        ReviewCommands::Comments { id } => comments(&ctx, *id).await,
        ReviewCommands::Delete { id, yes } => {
            if !confirm(ctx.json, *yes, &format!("Delete review {}?", id))? {
                output::hint("Cancelled");
                return Ok(());
            }
            ctx.client.delete_review(*id).await?;
            if ctx.json {
                return output::print_json(&serde_json::json!({ "deleted": [id] }));
            }
            output::success(&format!("Deleted review {}", id));
            Ok(())
        }
    }
}

fn report(ctx: &Context, review: &TestCaseReview, verb: &str) -> Result<()> {
    if ctx.json {
        return output::print_json(review);
    }
    output::success(&format!(
        "{} {} ({})",
        verb,
        review.id,
        output::status(&review.status.to_string())
    ));
    Ok(())
}

async fn list(ctx: &Context, query: &ReviewQuery) -> Result<()> {
    let reviews = ctx.client.list_reviews(query).await?;
    if ctx.json {
        return output::print_json(&reviews);
    }

    output::heading(&format!("Reviews ({})", reviews.len()));
    let mut table = Table::new(["ID", "Title", "Test case", "Status", "Reviewers", "Created"]);
    for r in &reviews {
        let reviewers: Vec<String> = r.reviewer_ids.iter().map(u64::to_string).collect();
        table.row([
            r.id.to_string(),
            r.title.clone(),
            r.test_case_name
                .clone()
                .unwrap_or_else(|| r.test_case_id.to_string()),
            r.status.to_string(),
            reviewers.join(","),
            output::opt(&r.created_at),
        ]);
    }
    table.print();
    Ok(())
}

async fn get(ctx: &Context, id: u64) -> Result<()> {
    let review = ctx.client.get_review(id).await?;
    if ctx.json {
        return output::print_json(&review);
    }

    output::heading(&review.title);
    println!("  {}  {}", "ID:".dimmed(), review.id);
    println!(
        "  {}  {}",
        "Status:".dimmed(),
        output::status(&review.status.to_string())
    );
    println!(
        "  {}  {} ({})",
        "Test case:".dimmed(),
        review.test_case_id,
        output::opt(&review.test_case_name)
    );
    println!("  {}  {}", "Created by:".dimmed(), output::opt(&review.creator_name));
    println!("  {}  {}", "Reviewed by:".dimmed(), output::opt(&review.reviewer_name));
    println!("  {}  {}", "Description:".dimmed(), output::opt(&review.description));
    if !review.review_comments.is_empty() {
        println!();
        println!("  {}", "Comments".bold());
        for c in &review.review_comments {
            let who = c
                .commenter_name
                .clone()
                .unwrap_or_else(|| format!("user {}", c.commenter_id));
            println!("    {} {}: {}", "◆".cyan(), who.bold(), c.content);
        }
    }
    Ok(())
}

async fn comments(ctx: &Context, id: u64) -> Result<()> {
    let comments = ctx.client.review_comments(id).await?;
    if ctx.json {
        return output::print_json(&comments);
    }

    output::heading(&format!("Comments on review {} ({})", id, comments.len()));
    let mut table = Table::new(["ID", "Author", "Type", "Comment", "Posted"]);
    for c in &comments {
        table.row([
            c.id.to_string(),
            c.commenter_name
                .clone()
                .unwrap_or_else(|| c.commenter_id.to_string()),
            output::opt(&c.kind),
            c.content.clone(),
            output::opt(&c.created_at),
        ]);
    }
    table.print();
    Ok(())
}
