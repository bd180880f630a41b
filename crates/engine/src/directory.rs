//! Actor directory: the caller's own actors followed by net-new store actors.

use std::collections::HashSet;

use actorbench_api::{ActorPlatform, ApiError, ListScope};
use actorbench_types::Actor;
use tracing::{debug, warn};

/// Fetches both listings concurrently and merges them.
///
/// Only the owned listing is load-bearing: its failure is returned, while a
/// failed store listing degrades to the owned set.
pub async fn fetch_directory(platform: &dyn ActorPlatform) -> Result<Vec<Actor>, ApiError> {
    let (owned, store) = tokio::join!(platform.list_actors(ListScope::Owned), platform.list_actors(ListScope::Store));

    let owned = owned?;
    let store = store.unwrap_or_else(|error| {
        warn!(error = %error, "could not fetch store actors; continuing with owned actors only");
        Vec::new()
    });
    debug!(owned = owned.len(), store = store.len(), "fetched actor listings");

    Ok(merge_directory(owned, store))
}

/// Appends entries of `second` whose identifiers are not yet present,
/// preserving the relative order of both inputs.
pub fn merge_directory(first: Vec<Actor>, second: Vec<Actor>) -> Vec<Actor> {
    let mut seen: HashSet<String> = first.iter().map(|actor| actor.id.clone()).collect();
    let mut merged = first;
    for actor in second {
        if seen.insert(actor.id.clone()) {
            merged.push(actor);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Reply, ScriptedPlatform, actor};

    fn ids(actors: &[Actor]) -> Vec<&str> {
        actors.iter().map(|actor| actor.id.as_str()).collect()
    }

    #[test]
    fn merge_keeps_first_set_and_appends_net_new_entries() {
        let mut owned_two = actor("2");
        owned_two.title = Some("owned copy".into());
        let merged = merge_directory(vec![actor("1"), owned_two], vec![actor("2"), actor("3")]);

        assert_eq!(ids(&merged), vec!["1", "2", "3"]);
        assert_eq!(merged[1].title.as_deref(), Some("owned copy"));
    }

    #[test]
    fn merge_drops_duplicates_within_the_second_set() {
        let merged = merge_directory(vec![actor("1")], vec![actor("4"), actor("1"), actor("4"), actor("3")]);
        assert_eq!(ids(&merged), vec!["1", "4", "3"]);
    }

    #[tokio::test]
    async fn store_failure_degrades_to_owned_actors() {
        let platform = ScriptedPlatform::with_directory(
            Reply::Ok(vec![actor("1"), actor("2")]),
            Reply::Status(503, "HTTP 503: Service Unavailable"),
        );

        let actors = fetch_directory(&platform).await.expect("owned listing succeeded");
        assert_eq!(ids(&actors), vec!["1", "2"]);
    }

    #[tokio::test]
    async fn owned_failure_propagates() {
        let platform = ScriptedPlatform::with_directory(
            Reply::Status(401, "User was not found or authentication token is not valid"),
            Reply::Ok(vec![actor("3")]),
        );

        let error = fetch_directory(&platform).await.expect_err("owned listing failed");
        assert_eq!(error.status_code(), Some(401));
        assert_eq!(error.to_string(), "User was not found or authentication token is not valid");
    }
}
