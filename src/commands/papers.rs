//! Paper views and the add/link forms

use super::format_timestamp;
use crate::error::{Error, Result};
use crate::models::{LinkPaper, NewPaper, Page, ProjectPaper};
use crate::session::Session;
use tracing::info;
use uuid::Uuid;

pub async fn cmd_list_papers(
    session: &Session,
    project_id: Uuid,
    page: Option<Page>,
) -> Result<Vec<ProjectPaper>> {
    info!(project_id = %project_id, "Listing papers");
    session.papers(project_id, page).await
}

pub async fn cmd_show_paper(
    session: &Session,
    project_id: Uuid,
    paper_id: Uuid,
) -> Result<ProjectPaper> {
    session.paper(project_id, paper_id).await
}

pub async fn cmd_add_paper(
    session: &Session,
    project_id: Uuid,
    paper: NewPaper,
) -> Result<ProjectPaper> {
    if paper.title.trim().is_empty() {
        return Err(Error::InvalidInput("Paper title must not be empty".to_string()));
    }
    let paper = NewPaper {
        title: paper.title.trim().to_string(),
        authors: paper
            .authors
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect(),
        ..paper
    };
    session.add_paper(project_id, paper).await
}

pub async fn cmd_link_paper(
    session: &Session,
    project_id: Uuid,
    link: LinkPaper,
) -> Result<ProjectPaper> {
    if let Some(score) = link.score {
        if !score.is_finite() {
            return Err(Error::InvalidInput(format!("Score must be a finite number, got {}", score)));
        }
    }
    session.link_paper(project_id, link).await
}

pub fn print_papers(papers: &[ProjectPaper]) {
    println!("\n📄 Papers\n");

    if papers.is_empty() {
        println!("No papers in this project yet. Add one with 'lrweb papers add <project-id> <title>'.");
        return;
    }

    for association in papers {
        let paper = &association.paper;
        match paper.year {
            Some(year) => println!("• {} ({})", paper.title, year),
            None => println!("• {}", paper.title),
        }
        if !paper.authors.is_empty() {
            println!("  {}", paper.authors.join(", "));
        }
        println!("  ID: {}", paper.id);
        if let Some(score) = association.score {
            println!("  Score: {:.3}", score);
        }
        println!();
    }
}

pub fn print_paper(association: &ProjectPaper) {
    let paper = &association.paper;
    println!("\n📄 {}\n", paper.title);
    println!("ID: {}", paper.id);
    if !paper.authors.is_empty() {
        println!("Authors: {}", paper.authors.join(", "));
    }
    if let Some(year) = paper.year {
        println!("Year: {}", year);
    }
    if let Some(doi) = &paper.doi {
        println!("DOI: {}", doi);
    }
    if let Some(arxiv_id) = &paper.arxiv_id {
        println!("arXiv: {}", arxiv_id);
    }
    println!("Added: {}", format_timestamp(&association.added_at));
    if let Some(reason) = &association.inclusion_reason {
        println!("Included because: {}", reason);
    }
    if let Some(score) = association.score {
        println!("Score: {:.3}", score);
    }
    if let Some(abstract_text) = &paper.abstract_text {
        println!("\n{}", abstract_text);
    }
}

pub fn print_added_paper(association: &ProjectPaper) {
    println!("✓ Added '{}' to project", association.paper.title);
    println!("  Paper ID: {}", association.paper_id);
}
