pub mod github_api_helper;
pub mod search_repo_query;

pub mod search_repo_api_response {
    /// Envelope of a Github GraphQL reply. `data` is null when the whole query
    /// failed (e.g. rate limited), `errors` may also accompany partial data.
    #[derive(serde::Deserialize, Debug)]
    pub(crate) struct GetRepoResponse {
        pub(crate) data: Option<ResponseData>,
        #[serde(default)]
        pub(crate) errors: Vec<GraphqlError>,
    }
    #[derive(serde::Deserialize, Debug)]
    pub(crate) struct ResponseData {
        pub(crate) search: Option<SearchPage>,
    }
    #[derive(serde::Deserialize, Debug)]
    pub(crate) struct GraphqlError {
        pub(crate) message: String,
        #[serde(rename = "type")]
        pub(crate) kind: Option<String>,
    }

    /// One page of search results. Edges are kept as raw json and written as-is.
    #[derive(serde::Deserialize, Debug, Clone, PartialEq)]
    pub struct SearchPage {
        #[serde(rename = "repositoryCount")]
        pub repository_count: u64,
        #[serde(rename = "pageInfo")]
        pub page_info: GithubPageInfo,
        pub edges: Vec<serde_json::Value>,
    }
    #[derive(serde::Deserialize, Debug, Clone, PartialEq)]
    pub struct GithubPageInfo {
        #[serde(rename = "endCursor")]
        pub end_cursor: Option<String>,
        #[serde(rename = "hasNextPage")]
        pub has_next_page: bool,
    }
}
