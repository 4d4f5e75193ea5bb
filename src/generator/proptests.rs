//! Property-based tests for the round loop
//!
//! Whatever the model keeps asking for, a query stays within its round
//! budget and ends on a tool-less call.

use super::round::{next_step, NextCall, Step};
use super::{AiGenerator, GenerateRequest, GeneratorSettings};
use crate::llm::LlmResponse;
use crate::testing::{text_response, tool_use_response, MockLlmClient, MockToolExecutor};
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_response() -> impl Strategy<Value = LlmResponse> {
    prop_oneof![
        "[a-zA-Z ]{0,20}".prop_map(|text| text_response(&text)),
        (1usize..4).prop_map(|n| {
            let calls: Vec<_> = (0..n)
                .map(|i| {
                    (
                        format!("toolu_{i}"),
                        "search_course_content",
                        json!({"query": format!("q{i}")}),
                    )
                })
                .collect();
            let borrowed: Vec<_> = calls
                .iter()
                .map(|(id, name, input)| (id.as_str(), *name, input.clone()))
                .collect();
            tool_use_response(&borrowed)
        }),
    ]
}

fn run_query(responses: Vec<LlmResponse>, max_rounds: u32) -> (Arc<MockLlmClient>, usize, String) {
    let llm = Arc::new(MockLlmClient::new());
    for response in responses {
        llm.queue_response(response);
    }
    let executor = MockToolExecutor::new().with_tool("search_course_content", "hits");
    let generator = AiGenerator::new(llm.clone(), GeneratorSettings::default());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let answer = runtime
        .block_on(
            generator.generate(
                GenerateRequest::new("question")
                    .tools_from(&executor)
                    .max_rounds(max_rounds),
            ),
        )
        .unwrap();
    let executions = executor.recorded_executions().len();
    (llm, executions, answer)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_next_step_round_never_exceeds_budget(
        completed in 0u32..10,
        max_rounds in 1u32..10,
        offered in any::<bool>(),
        wants in any::<bool>(),
    ) {
        prop_assume!(completed < max_rounds);
        match next_step(completed, max_rounds, offered, wants) {
            Step::Finish => prop_assert!(!offered || !wants),
            Step::ExecuteTools { round, next_call } => {
                prop_assert!(round <= max_rounds);
                prop_assert_eq!(next_call == NextCall::WithoutTools, round == max_rounds);
            }
        }
    }

    #[test]
    fn prop_calls_bounded_by_round_budget(
        responses in proptest::collection::vec(arb_response(), 4..6),
        max_rounds in 1u32..4,
    ) {
        // Enough queued responses that the budget, not the queue, ends the loop
        let (llm, executions, _) = run_query(responses, max_rounds);
        let requests = llm.recorded_requests();
        let max_calls = max_rounds as usize + 1;

        prop_assert!(requests.len() <= max_calls);
        prop_assert!(executions <= max_rounds as usize * 3);

        if requests.len() == max_calls {
            let last = &requests[max_calls - 1];
            prop_assert!(last.tools.is_empty());
            prop_assert!(last.tool_choice.is_none());
        }
        for request in &requests[..requests.len() - 1] {
            prop_assert!(!request.tools.is_empty());
        }
    }

    #[test]
    fn prop_text_first_response_is_single_call(
        text in "[a-zA-Z ]{0,40}",
        max_rounds in 1u32..5,
    ) {
        let (llm, executions, answer) = run_query(vec![text_response(&text)], max_rounds);
        prop_assert_eq!(llm.call_count(), 1);
        prop_assert_eq!(executions, 0);
        prop_assert_eq!(answer, text);
    }
}
