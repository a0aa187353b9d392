use std::collections::HashMap;

use serde::Deserialize;
use serde_json::json;

use super::HardcoverClient;
use crate::domain::HydratedBook;

const SEARCH_QUERY: &str = "query SearchBooks($query: String!, $page: Int!) {
  search(query: $query, per_page: 25, page: $page, query_type: \"Book\") {
    ids
  }
}";

const HYDRATE_QUERY: &str = "query HydrateBooks($ids: [Int!]) {
  books(where: { id: { _in: $ids }}) {
    id
    title
    contributions { author { name } }
    image { url }
  }
}";

#[derive(Deserialize)]
struct SearchData {
    search: Option<SearchIds>,
}

#[derive(Deserialize)]
struct SearchIds {
    ids: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct BooksData {
    books: Option<Vec<HydratedBook>>,
}

impl HardcoverClient {
    /// Thin search pass-through: the search endpoint ranks and returns
    /// ids, a second query hydrates them, and the hydrated rows are put
    /// back into ranking order.
    pub async fn search_books(
        &self,
        title: &str,
        author: Option<&str>,
        page: i64,
    ) -> Vec<HydratedBook> {
        if !self.ensure_authenticated() {
            return Vec::new();
        }

        let q = format!("{} {}", title, author.unwrap_or("")).trim().to_string();
        if q.is_empty() {
            return Vec::new();
        }

        let data = match self
            .graphql
            .execute_as::<SearchData>(SEARCH_QUERY, json!({"query": q, "page": page}))
            .await
        {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, "search query failed");
                return Vec::new();
            }
        };

        let ids: Vec<i64> = data
            .search
            .and_then(|s| s.ids)
            .unwrap_or_default()
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        if ids.is_empty() {
            return Vec::new();
        }

        self.hydrate_books(&ids).await
    }

    async fn hydrate_books(&self, ids: &[i64]) -> Vec<HydratedBook> {
        let data = match self
            .graphql
            .execute_as::<BooksData>(HYDRATE_QUERY, json!({"ids": ids}))
            .await
        {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, "hydration query failed");
                return Vec::new();
            }
        };

        let mut books = data.books.unwrap_or_default();
        // The hydration query returns rows in id order; restore the
        // search ranking.
        let rank: HashMap<i64, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        books.sort_by_key(|b| rank.get(&b.id).copied().unwrap_or(usize::MAX));
        books
    }
}
