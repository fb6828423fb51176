//! RemoteSupplier against a scripted remote service.

use concord_storage::{EntitySupplier, RemoteSupplier, Route, RouteParams};
use concord_test_utils::fixtures;
use concord_test_utils::{
    transport_failure, wire, ConcordError, GuildMemberPayload, MockRemoteService, PruneCount,
    ReactionEmoji, RemoteConfig, RequestError, Snowflake,
};
use futures::{StreamExt, TryStreamExt};
use std::sync::Arc;

fn supplier(mock: &Arc<MockRemoteService>, config: RemoteConfig) -> RemoteSupplier {
    RemoteSupplier::new(mock.clone(), config).unwrap()
}

fn guild_params(guild_id: u64) -> RouteParams {
    RouteParams::new().guild(Snowflake::new(guild_id))
}

fn member_payloads(guild_id: u64, users: std::ops::RangeInclusive<u64>) -> Vec<GuildMemberPayload> {
    users
        .map(|id| fixtures::member_payload(&fixtures::member(guild_id, id), Some(&fixtures::user(id))))
        .collect()
}

#[tokio::test]
async fn test_members_paginate_in_two_fetches() {
    let mock = MockRemoteService::shared();
    mock.serve_collection(
        Route::GuildMembersGet,
        guild_params(1),
        &member_payloads(1, 1..=150),
        |p| p.user_id().unwrap_or_default(),
    );
    let remote = supplier(&mock, RemoteConfig::default().with_members_batch_size(100));

    let members: Vec<_> = remote
        .get_guild_members(Snowflake::new(1))
        .try_collect()
        .await
        .unwrap();

    assert_eq!(members.len(), 150);
    let ids: Vec<u64> = members.iter().map(|m| m.user_id().value()).collect();
    assert_eq!(ids, (1..=150).collect::<Vec<_>>());
    assert_eq!(*members[0].member, fixtures::member(1, 1));
    assert_eq!(mock.call_count(Route::GuildMembersGet), 2);

    let cursors: Vec<Option<Snowflake>> = mock.calls().into_iter().map(|(_, p)| p.after).collect();
    assert_eq!(cursors, vec![None, Some(Snowflake::new(100))]);
}

#[tokio::test]
async fn test_short_first_page_fetches_once() {
    let mock = MockRemoteService::shared();
    let users: Vec<_> = (1..=30).map(fixtures::user).collect();
    let bans: Vec<_> = users.iter().map(fixtures::ban_payload).collect();
    mock.serve_collection(Route::GuildBansGet, guild_params(1), &bans, |b| b.user.id);
    let remote = supplier(&mock, RemoteConfig::default().with_bans_batch_size(100));

    let fetched: Vec<_> = remote
        .get_guild_bans(Snowflake::new(1))
        .try_collect()
        .await
        .unwrap();
    assert_eq!(fetched.len(), 30);
    assert_eq!(*fetched[0], fixtures::ban(1, 1));
    assert_eq!(mock.call_count(Route::GuildBansGet), 1);
}

#[tokio::test]
async fn test_unordered_page_is_rejected() {
    let mock = MockRemoteService::shared();
    let bans = vec![
        fixtures::ban_payload(&fixtures::user(5)),
        fixtures::ban_payload(&fixtures::user(3)),
    ];
    mock.respond(
        Route::GuildBansGet,
        guild_params(1).after(None).limit(2),
        wire(&bans),
    );
    let remote = supplier(&mock, RemoteConfig::default().with_bans_batch_size(2));

    let results: Vec<_> = remote.get_guild_bans(Snowflake::new(1)).collect().await;
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert_eq!(
        results[1].clone().unwrap_err(),
        ConcordError::PaginationOrder {
            cursor: Snowflake::new(5),
            id: Snowflake::new(3)
        }
    );
}

#[tokio::test]
async fn test_page_failure_keeps_emitted_items() {
    let mock = MockRemoteService::shared();
    mock.serve_collection(
        Route::GuildMembersGet,
        guild_params(1),
        &member_payloads(1, 1..=10),
        |p| p.user_id().unwrap_or_default(),
    );
    mock.fail(
        Route::GuildMembersGet,
        guild_params(1).after(Some(Snowflake::new(5))).limit(5),
        transport_failure(Route::GuildMembersGet),
    );
    let remote = supplier(&mock, RemoteConfig::default().with_members_batch_size(5));

    let results: Vec<_> = remote.get_guild_members(Snowflake::new(1)).collect().await;
    assert_eq!(results.len(), 6);
    assert!(results[..5].iter().all(Result::is_ok));
    assert!(matches!(
        results[5],
        Err(ConcordError::Request(RequestError::Transport { .. }))
    ));
}

#[tokio::test]
async fn test_member_without_embedded_user_fetches_user() {
    let mock = MockRemoteService::shared();
    let params = guild_params(1).user(Snowflake::new(8));
    mock.respond(
        Route::GuildMemberGet,
        params,
        wire(&fixtures::member_payload(&fixtures::member(1, 8), None)),
    );
    mock.respond(
        Route::UserGet,
        RouteParams::new().user(Snowflake::new(8)),
        wire(&fixtures::user(8)),
    );
    let remote = supplier(&mock, RemoteConfig::default());

    let member = remote
        .get_member(Snowflake::new(1), Snowflake::new(8))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(*member.user, fixtures::user(8));
    assert_eq!(mock.call_count(Route::UserGet), 1);
}

#[tokio::test]
async fn test_member_with_missing_user_is_none() {
    let mock = MockRemoteService::shared();
    mock.respond(
        Route::GuildMemberGet,
        guild_params(1).user(Snowflake::new(8)),
        wire(&fixtures::member_payload(&fixtures::member(1, 8), None)),
    );
    let remote = supplier(&mock, RemoteConfig::default());

    let member = remote
        .get_member(Snowflake::new(1), Snowflake::new(8))
        .await
        .unwrap();
    assert!(member.is_none());
}

#[tokio::test]
async fn test_not_found_is_absent_not_error() {
    let mock = MockRemoteService::shared();
    let remote = supplier(&mock, RemoteConfig::default());

    assert!(remote.get_guild(Snowflake::new(1)).await.unwrap().is_none());
    assert!(remote
        .get_member(Snowflake::new(1), Snowflake::new(2))
        .await
        .unwrap()
        .is_none());
    assert_eq!(mock.call_count(Route::UserGet), 0);

    let roles: Vec<_> = remote
        .get_guild_roles(Snowflake::new(1))
        .try_collect()
        .await
        .unwrap();
    assert!(roles.is_empty());
}

#[tokio::test]
async fn test_failures_propagate_unmodified() {
    let mock = MockRemoteService::shared();
    let limited = RequestError::RateLimited {
        route: "GET /guilds/1".to_string(),
        retry_after_ms: 250,
    };
    mock.fail(Route::GuildGet, guild_params(1), limited.clone());
    let remote = supplier(&mock, RemoteConfig::default());

    let err = remote.get_guild(Snowflake::new(1)).await.unwrap_err();
    assert_eq!(err, ConcordError::Request(limited));
}

#[tokio::test]
async fn test_malformed_body_is_decode_failure() {
    let mock = MockRemoteService::shared();
    mock.respond(
        Route::UserGet,
        RouteParams::new().user(Snowflake::new(1)),
        serde_json::json!({"id": "1", "username": 42}),
    );
    let remote = supplier(&mock, RemoteConfig::default());

    let err = remote.get_user(Snowflake::new(1)).await.unwrap_err();
    assert!(matches!(err, ConcordError::Request(RequestError::Decode { .. })));
}

#[tokio::test]
async fn test_role_lookup_filters_listing() {
    let mock = MockRemoteService::shared();
    let roles = vec![fixtures::role(1, 1), fixtures::role(1, 20), fixtures::role(1, 30)];
    let payloads: Vec<_> = roles.iter().map(fixtures::role_payload).collect();
    mock.respond(Route::GuildRolesGet, guild_params(1), wire(&payloads));
    let remote = supplier(&mock, RemoteConfig::default());

    let role = remote
        .get_role(Snowflake::new(1), Snowflake::new(20))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(*role, fixtures::role(1, 20));
    assert!(remote
        .get_role(Snowflake::new(1), Snowflake::new(99))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_guild_listing_skips_vanished_guilds() {
    let mock = MockRemoteService::shared();
    let partials = vec![fixtures::partial_guild(1), fixtures::partial_guild(2)];
    mock.serve_collection(Route::CurrentUserGuildsGet, RouteParams::new(), &partials, |g| g.id);
    mock.respond(Route::GuildGet, guild_params(2), wire(&fixtures::guild(2, 7)));
    let remote = supplier(&mock, RemoteConfig::default());

    let guilds: Vec<_> = remote.get_guilds().try_collect().await.unwrap();
    assert_eq!(guilds.len(), 1);
    assert_eq!(*guilds[0], fixtures::guild(2, 7));
}

#[tokio::test]
async fn test_reactors_use_formatted_emoji() {
    let mock = MockRemoteService::shared();
    let emoji = ReactionEmoji::Custom {
        id: Snowflake::new(41),
        name: "party".to_string(),
        animated: false,
    };
    let users: Vec<_> = (1..=3).map(fixtures::user).collect();
    let params = RouteParams::new()
        .channel(Snowflake::new(4))
        .message(Snowflake::new(40))
        .emoji(emoji.formatted());
    mock.serve_collection(Route::ReactionsGet, params, &users, |u| u.id);
    let remote = supplier(&mock, RemoteConfig::default().with_reactors_batch_size(2));

    let reactors: Vec<_> = remote
        .get_reactors(Snowflake::new(4), Snowflake::new(40), emoji)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(reactors.len(), 3);
    assert_eq!(mock.call_count(Route::ReactionsGet), 2);
}

#[tokio::test]
async fn test_prune_count_reads_remote() {
    let mock = MockRemoteService::shared();
    mock.respond(
        Route::GuildPruneCountGet,
        guild_params(1).days(7),
        serde_json::json!({"pruned": 12}),
    );
    let remote = supplier(&mock, RemoteConfig::default());

    let count = remote
        .get_guild_prune_count(Snowflake::new(1), 7)
        .await
        .unwrap();
    assert_eq!(count, Some(PruneCount { pruned: Some(12) }));
}

#[test]
fn test_zero_batch_size_rejected() {
    let mock = MockRemoteService::shared();
    let err = RemoteSupplier::new(mock, RemoteConfig::default().with_members_batch_size(0)).unwrap_err();
    assert!(matches!(err, ConcordError::Config(_)));
}
