//! Integration tests for full turns through the orchestrator.
//!
//! Each test wires mock collaborators into a real `Orchestrator` and checks
//! the grounded answer (or the error) a caller would see.

use asklang::{
    testing::{CitingModel, MockWebSearcher, ScriptedModel},
    AgentConfig, CollaboratorError, ConversationTurn, GroundedAnswer, Orchestrator, TurnError,
};

const QUESTION: &str = "Who won the 2022 World Cup?";
const QUERY: &str = "2022 World Cup winner";
const URL_A: &str = "https://a.example/wc2022";
const URL_B: &str = "https://b.example/wc2022-recap";

/// Helper to build a searcher that knows the World Cup query.
fn world_cup_searcher() -> MockWebSearcher {
    MockWebSearcher::new().with_urls(QUERY, &[URL_A, URL_B])
}

/// Helper to run one turn with the default config.
async fn run(model: ScriptedModel, searcher: MockWebSearcher) -> Result<GroundedAnswer, TurnError> {
    let orchestrator = Orchestrator::new(model, searcher, AgentConfig::default());
    orchestrator
        .run_turn(vec![ConversationTurn::user(QUESTION)], "facts", "gpt-4o-mini")
        .await
}

#[tokio::test]
async fn test_cited_search_result_is_kept() {
    let model = ScriptedModel::new()
        .then_search(QUERY)
        .then_answer(format!("Argentina won the final on penalties.\n\nSources:\n- {URL_A}"));

    let answer = run(model, world_cup_searcher()).await.unwrap();

    assert_eq!(answer.sources, vec![URL_A.to_string()]);
    assert!(!answer.fallback_used);
    assert_eq!(answer.body_text, "Argentina won the final on penalties.");
    assert_eq!(answer.searches, 1);
    assert_eq!(answer.rounds, 2);
}

#[tokio::test]
async fn test_hallucinated_citation_falls_back_to_search_results() {
    let model = ScriptedModel::new()
        .then_search(QUERY)
        .then_answer("Argentina.\n\nSources:\n- https://totally-unrelated.example/fake");

    let answer = run(model, world_cup_searcher()).await.unwrap();

    assert!(answer.fallback_used);
    assert_eq!(answer.sources, vec![URL_A.to_string(), URL_B.to_string()]);
    assert!(!answer.body_text.contains("totally-unrelated"));
}

#[tokio::test]
async fn test_fallback_respects_configured_count() {
    let model = ScriptedModel::new()
        .then_search(QUERY)
        .then_answer("Argentina.");
    let orchestrator = Orchestrator::new(
        model,
        world_cup_searcher(),
        AgentConfig::default().with_fallback_sources(1),
    );

    let answer = orchestrator
        .run_turn(vec![ConversationTurn::user(QUESTION)], "summary", "m")
        .await
        .unwrap();

    assert!(answer.fallback_used);
    assert_eq!(answer.sources, vec![URL_A.to_string()]);
}

#[tokio::test]
async fn test_model_that_never_stops_searching_hits_round_cap() {
    let model = ScriptedModel::new().searching_forever(QUERY);
    let orchestrator = Orchestrator::new(
        model,
        world_cup_searcher(),
        AgentConfig::default().with_max_rounds(3),
    );

    let err = orchestrator
        .run_turn(vec![ConversationTurn::user(QUESTION)], "facts", "m")
        .await
        .unwrap_err();

    assert!(matches!(err, TurnError::ToolLoopExceeded { max_rounds: 3 }));
    assert_eq!(orchestrator.searcher().queries().len(), 3);
}

#[tokio::test]
async fn test_answer_without_search_has_no_sources_even_if_it_cites() {
    let model = ScriptedModel::new().then_answer(format!("Argentina. See {URL_A}"));

    let answer = run(model, world_cup_searcher()).await.unwrap();

    assert!(answer.sources.is_empty());
    assert!(!answer.fallback_used);
    assert_eq!(answer.searches, 0);
}

#[tokio::test]
async fn test_search_failure_fails_the_turn_with_cause() {
    let model = ScriptedModel::new().then_search(QUERY).then_answer("unused");
    let searcher = MockWebSearcher::new().failing(QUERY, "search backend unavailable");

    let err = run(model, searcher).await.unwrap_err();

    match err {
        TurnError::TurnFailed(CollaboratorError::Search(cause)) => {
            assert_eq!(cause.to_string(), "search backend unavailable");
        }
        other => panic!("expected a search failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_model_failure_fails_the_turn() {
    // An empty script errors on the first call.
    let err = run(ScriptedModel::new(), world_cup_searcher())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TurnError::TurnFailed(CollaboratorError::Protocol(_))
    ));
}

#[tokio::test]
async fn test_unknown_mode_is_rejected() {
    let model = ScriptedModel::new().then_answer("never reached");
    let orchestrator = Orchestrator::new(model, world_cup_searcher(), AgentConfig::default());

    for mode in ["", "FACTS", "Links", "brief"] {
        let err = orchestrator
            .run_turn(vec![ConversationTurn::user(QUESTION)], mode, "m")
            .await
            .unwrap_err();
        assert!(matches!(err, TurnError::UnknownMode(ref e) if e.mode == mode));
    }
    assert!(orchestrator.searcher().queries().is_empty());
}

#[tokio::test]
async fn test_multiple_searches_accumulate_in_order() {
    let model = ScriptedModel::new()
        .then_searches([QUERY, "world cup final score"])
        .then_search("messi world cup")
        .then_answer("Argentina beat France.");
    let searcher = world_cup_searcher()
        .with_urls("world cup final score", &["https://c.example/score", URL_A])
        .with_urls("messi world cup", &["https://d.example/messi"]);
    let orchestrator = Orchestrator::new(
        model,
        searcher,
        AgentConfig::default().with_fallback_sources(10),
    );

    let answer = orchestrator
        .run_turn(vec![ConversationTurn::user(QUESTION)], "links", "m")
        .await
        .unwrap();

    assert_eq!(answer.searches, 3);
    assert_eq!(
        answer.sources,
        vec![
            URL_A.to_string(),
            URL_B.to_string(),
            "https://c.example/score".to_string(),
            "https://d.example/messi".to_string(),
        ]
    );
    assert_eq!(
        orchestrator.searcher().queries(),
        vec![QUERY, "world cup final score", "messi world cup"]
    );
}

#[tokio::test]
async fn test_turns_do_not_share_allowed_urls() {
    let model = ScriptedModel::new()
        .then_search(QUERY)
        .then_answer(format!("Argentina.\n\nSources:\n- {URL_A}"))
        .then_answer(format!("Same answer as before: {URL_A}"));
    let orchestrator = Orchestrator::new(model, world_cup_searcher(), AgentConfig::default());

    let first = orchestrator
        .run_turn(vec![ConversationTurn::user(QUESTION)], "facts", "m")
        .await
        .unwrap();
    assert_eq!(first.sources, vec![URL_A.to_string()]);

    let second = orchestrator
        .run_turn(
            vec![
                ConversationTurn::user(QUESTION),
                ConversationTurn::assistant(first.body_text.clone()),
                ConversationTurn::user("Are you sure?"),
            ],
            "facts",
            "m",
        )
        .await
        .unwrap();

    assert!(second.sources.is_empty());
    assert!(!second.fallback_used);
}

#[tokio::test]
async fn test_concurrent_turns_are_isolated() {
    let searcher = MockWebSearcher::new()
        .with_urls("rust language", &["https://rust.example/book"])
        .with_urls("python language", &["https://python.example/tutorial"]);
    let orchestrator = Orchestrator::new(CitingModel, searcher, AgentConfig::default());

    let (rust, python) = tokio::join!(
        orchestrator.run_turn(vec![ConversationTurn::user("rust language")], "facts", "m"),
        orchestrator.run_turn(vec![ConversationTurn::user("python language")], "facts", "m"),
    );

    let rust = rust.unwrap();
    let python = python.unwrap();
    assert_eq!(rust.sources, vec!["https://rust.example/book".to_string()]);
    assert_eq!(python.sources, vec!["https://python.example/tutorial".to_string()]);
    assert!(!rust.fallback_used && !python.fallback_used);
}

#[tokio::test]
async fn test_existing_preamble_is_not_duplicated() {
    let model = ScriptedModel::new().then_answer("ok");
    let orchestrator = Orchestrator::new(model, world_cup_searcher(), AgentConfig::default());
    let preamble = asklang::preamble_for("facts").unwrap();

    orchestrator
        .run_turn(
            vec![
                ConversationTurn::system(preamble.clone()),
                ConversationTurn::user(QUESTION),
            ],
            "facts",
            "m",
        )
        .await
        .unwrap();

    let calls = orchestrator.model().calls();
    let system_messages = calls[0]
        .messages
        .iter()
        .filter(|m| m.is_system_containing(&preamble))
        .count();
    assert_eq!(system_messages, 1);
    assert_eq!(calls[0].messages.len(), 2);
}

#[tokio::test]
async fn test_citation_with_parentheses_is_grounded() {
    let wiki = "https://en.wikipedia.org/wiki/2022_FIFA_World_Cup_(final)";
    let model = ScriptedModel::new()
        .then_search(QUERY)
        .then_answer(format!("Argentina beat France ([Wikipedia]({wiki})).\n\nSource: {wiki}"));
    let searcher = MockWebSearcher::new().with_urls(QUERY, &[wiki, URL_B]);

    let answer = run(model, searcher).await.unwrap();

    assert_eq!(answer.sources, vec![wiki.to_string()]);
    assert!(!answer.fallback_used);
    assert!(!answer.body_text.contains("Source:"));
}
