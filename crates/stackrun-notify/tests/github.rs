use mockito::Matcher;
use serde_json::json;
use stackrun_notify::{Comment, GithubNotifier, NotifyConfig, NotifyError, Report};
use url::Url;

const COMMENTS_PATH: &str = "/repos/acme/infra/issues/7/comments";
const BOT: &str = "github-actions[bot]";

fn notifier(server: &mockito::Server) -> GithubNotifier {
    let url = Url::parse(&format!("{}{COMMENTS_PATH}", server.url())).unwrap();
    GithubNotifier::new(url, "secret", BOT).unwrap()
}

fn comment_json(server: &mockito::Server, id: u64, login: &str, body: &str) -> serde_json::Value {
    json!({
        "id": id,
        "url": format!("{}/repos/acme/infra/issues/comments/{id}", server.url()),
        "body": body,
        "user": {"login": login},
    })
}

#[test]
fn report_starts_with_banner_and_embeds_json() {
    let report = Report::render("dev", "dryrun", &json!({"vpc.yml @ r": {"status": "no_change"}}))
        .unwrap();

    assert_eq!(report.banner, "***** dev dryrun result *****");
    assert!(report.body.starts_with(&report.banner));
    assert!(report.body.contains("```json"));
    assert!(report.body.contains("\"no_change\""));
}

#[test]
fn stale_report_needs_bot_author_and_banner_prefix() {
    let banner = Report::banner("dev", "deploy");
    let comment = |login: &str, body: &str| Comment {
        id: 1,
        url: "https://api.github.com/x".to_string(),
        body: body.to_string(),
        user: Some(stackrun_notify::github::CommentAuthor {
            login: login.to_string(),
        }),
    };

    assert!(comment(BOT, &format!("{banner}\n\n{{}}")).is_stale_report(BOT, &banner));
    assert!(!comment("alice", &format!("{banner}\n")).is_stale_report(BOT, &banner));
    assert!(!comment(BOT, "***** dev dryrun result *****").is_stale_report(BOT, &banner));
    assert!(!comment(BOT, &format!("quoted: {banner}")).is_stale_report(BOT, &banner));
}

#[test]
fn config_without_url_disables_notifier() {
    let config = NotifyConfig::from_lookup(|key| match key {
        "GITHUB_TOKEN" => Some("secret".to_string()),
        "URL" => Some(String::new()),
        _ => None,
    })
    .unwrap();

    assert!(!config.is_enabled());
    assert_eq!(config.bot_login, BOT);
    assert!(GithubNotifier::from_config(&config).unwrap().is_none());
}

#[test]
fn config_rejects_malformed_url() {
    let err = NotifyConfig::from_lookup(|key| (key == "URL").then(|| "not a url".to_string()))
        .unwrap_err();
    assert!(matches!(err, NotifyError::InvalidUrl { .. }));
}

#[tokio::test]
async fn publish_replaces_previous_report_only() {
    let mut server = mockito::Server::new_async().await;
    let banner = Report::banner("dev", "dryrun");

    let listing = json!([
        comment_json(&server, 11, BOT, &format!("{banner}\n\nold")),
        comment_json(&server, 12, "alice", &format!("{banner}\n\nquoted by a human")),
        comment_json(&server, 13, BOT, "***** dev deploy result *****\n\nother mode"),
        comment_json(&server, 20, BOT, &format!("{banner}\n\nnew")),
    ]);
    let list = server
        .mock("GET", COMMENTS_PATH)
        .match_header("authorization", "token secret")
        .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(listing.to_string())
        .expect(1)
        .create_async()
        .await;
    let delete_old = server
        .mock("DELETE", "/repos/acme/infra/issues/comments/11")
        .match_header("authorization", "token secret")
        .with_status(204)
        .expect(1)
        .create_async()
        .await;
    let delete_other = server
        .mock("DELETE", Matcher::Regex(r"^/repos/acme/infra/issues/comments/(12|13|20)$".into()))
        .expect(0)
        .create_async()
        .await;
    let posted = comment_json(&server, 20, BOT, &format!("{banner}\n\nnew")).to_string();
    let post = server
        .mock("POST", COMMENTS_PATH)
        .match_header("authorization", "token secret")
        .match_body(Matcher::PartialJson(json!({"body": format!("{banner}\n\nnew")})))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(posted)
        .expect(1)
        .create_async()
        .await;

    let report = Report {
        banner: banner.clone(),
        body: format!("{banner}\n\nnew"),
    };
    let summary = notifier(&server).publish(&report).await.unwrap();

    assert_eq!(summary.deleted, 1);
    assert_eq!(summary.posted.id, 20);
    list.assert_async().await;
    delete_old.assert_async().await;
    delete_other.assert_async().await;
    post.assert_async().await;
}

#[tokio::test]
async fn failed_post_keeps_previous_report() {
    let mut server = mockito::Server::new_async().await;
    let banner = Report::banner("dev", "deploy");

    let listing = json!([comment_json(&server, 11, BOT, &format!("{banner}\n\nold"))]).to_string();
    let _list = server
        .mock("GET", COMMENTS_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(listing)
        .create_async()
        .await;
    let post = server
        .mock("POST", COMMENTS_PATH)
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message": "Server Error"}"#)
        .expect(1)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let report = Report {
        banner: banner.clone(),
        body: format!("{banner}\n\nnew"),
    };
    let err = notifier(&server).publish(&report).await.unwrap_err();

    assert!(matches!(err, NotifyError::Api { status: 500, .. }));
    post.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn list_follows_pages_until_short_page() {
    let mut server = mockito::Server::new_async().await;

    let full: Vec<_> = (0..100)
        .map(|i| comment_json(&server, i, "alice", "hi"))
        .collect();
    let first = server
        .mock("GET", COMMENTS_PATH)
        .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(serde_json::Value::Array(full).to_string())
        .create_async()
        .await;
    let last = json!([comment_json(&server, 100, BOT, "last")]).to_string();
    let second = server
        .mock("GET", COMMENTS_PATH)
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(last)
        .create_async()
        .await;

    let comments = notifier(&server).list_comments().await.unwrap();

    assert_eq!(comments.len(), 101);
    assert_eq!(comments[100].author(), Some(BOT));
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn api_errors_carry_status_and_message() {
    let mut server = mockito::Server::new_async().await;
    let _post = server
        .mock("POST", COMMENTS_PATH)
        .with_status(403)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message": "Resource not accessible by integration"}"#)
        .create_async()
        .await;

    let err = notifier(&server).post_comment("hello").await.unwrap_err();

    match err {
        NotifyError::Api { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "Resource not accessible by integration");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}
