pub mod aggregator;
pub mod forge;
pub mod forum;
pub mod syndication;

use newsloom_common::{Article, Source};
use newsloom_store::ArticleFilter;
use uuid::Uuid;

use crate::{publish_new_article, WorkerContext};

/// Shared insert tail for every worker: create the row, swallow a
/// unique-violation as "already seen", publish
/// `articles.new` on a genuine insert. Returns `Ok(None)` for an already-seen
/// URL/source_id pair.
pub async fn insert_and_publish(
    ctx: &WorkerContext,
    filter: ArticleFilter<'_>,
) -> Result<Option<Article>, crate::IngestError> {
    match ctx.store.create_article(filter).await {
        Ok(article) => {
            publish_new_article(&ctx.bus, article.id).await?;
            Ok(Some(article))
        }
        Err(newsloom_store::StoreError::UniqueViolation(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// If a source links to exactly one section, new articles from it get that
/// section pre-set; otherwise the processor assigns it later.
pub async fn presettable_section(ctx: &WorkerContext, source: &Source) -> Option<Uuid> {
    let sections = ctx.store.sections_for_source(source.id).await.ok()?;
    if sections.len() == 1 {
        Some(sections[0])
    } else {
        None
    }
}
