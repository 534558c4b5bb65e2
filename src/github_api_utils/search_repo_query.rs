use crate::settings::CrawlerSettings;

const SEARCH_REPOS_QUERY: &str = "query($searchQuery: String!, $first: Int!, $after: String)
{
    search(query: $searchQuery, type: REPOSITORY, first: $first, after: $after)
    {
        repositoryCount
        pageInfo
        {
            endCursor
            hasNextPage
        }
        edges
        {
            cursor
            node
            {
                ... on Repository
                {
                    name
                    url
                    descriptionHTML
                    languages(first: 10)
                    {
                        nodes
                        {
                            name
                        }
                    }
                    stargazers
                    {
                        totalCount
                    }
                    forks
                    {
                        totalCount
                    }
                    #submodules
                }
            }
        }
    }
}";

const SUBMODULE_COUNT_FIELDS: &str = "submodules
                    {
                        totalCount
                    }";

const SUBMODULE_NAME_FIELDS: &str = "updatedAt
                    submodules(first: 100)
                    {
                        totalCount
                        nodes
                        {
                            name
                            path
                        }
                    }";

/// Search expression: repositories above `min_stars`, most starred first.
pub fn search_expression(min_stars: u32) -> String {
    format!("stars:>{min_stars} sort:stars")
}

pub fn search_repos_query(include_submodule_names: bool) -> String {
    let submodule_fields = if include_submodule_names {
        SUBMODULE_NAME_FIELDS
    } else {
        SUBMODULE_COUNT_FIELDS
    };
    SEARCH_REPOS_QUERY.replace("#submodules", submodule_fields)
}

/// Request body for one page. `after` is left out entirely on the first page.
pub fn build_request_body(settings: &CrawlerSettings, after: Option<&str>) -> serde_json::Value {
    let mut variables = serde_json::json!({
        "searchQuery": search_expression(settings.min_stars),
        "first": settings.page_size,
    });
    if let Some(cursor) = after {
        variables["after"] = serde_json::Value::String(cursor.to_owned());
    }
    serde_json::json!({
        "query": search_repos_query(settings.include_submodule_names),
        "variables": variables,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(include_submodule_names: bool) -> CrawlerSettings {
        let mut settings =
            CrawlerSettings::from_sources(None, |k| (k == "GITHUB_ACCESS_TOKEN").then(|| "t".to_owned()))
                .unwrap();
        settings.include_submodule_names = include_submodule_names;
        settings
    }

    #[test]
    fn first_page_omits_after() {
        let body = build_request_body(&settings(false), None);

        let variables = body["variables"].as_object().unwrap();
        assert!(!variables.contains_key("after"));
        assert_eq!(variables["first"], 50);
        assert_eq!(variables["searchQuery"], "stars:>1000 sort:stars");
    }

    #[test]
    fn later_pages_carry_the_cursor_verbatim() {
        let body = build_request_body(&settings(false), Some("Y3Vyc29yOjUw\"odd"));

        assert_eq!(body["variables"]["after"], "Y3Vyc29yOjUw\"odd");
    }

    #[test]
    fn submodule_names_are_opt_in() {
        let basic = search_repos_query(false);
        assert!(basic.contains("descriptionHTML"));
        assert!(basic.contains("languages(first: 10)"));
        assert!(basic.contains("submodules\n"));
        assert!(!basic.contains("submodules(first: 100)"));
        assert!(!basic.contains("updatedAt"));
        assert!(!basic.contains("#submodules"));

        let detailed = search_repos_query(true);
        assert!(detailed.contains("submodules(first: 100)"));
        assert!(detailed.contains("path"));
        assert!(detailed.contains("updatedAt"));
    }
}
