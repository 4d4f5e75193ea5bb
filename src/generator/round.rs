//! Pure round transition for the tool-calling loop
//!
//! Given where the loop stands and what the model just said, decide the
//! next move. No I/O happens here, which keeps the round bound testable
//! in isolation.
//!
//! ```text
//! AWAIT_MODEL --no tool use--------------------> DONE
//! AWAIT_MODEL --tool use, rounds remain--------> EXECUTE_TOOLS -> AWAIT_MODEL
//! AWAIT_MODEL --tool use, rounds exhausted-----> EXECUTE_TOOLS -> FINAL_CALL_NO_TOOLS -> DONE
//! ```

/// How the model is called after a round's tools have run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextCall {
    /// Tools stay available so the model can chain lookups
    WithTools,
    /// Round budget spent; the model must answer in text
    WithoutTools,
}

/// Decision taken on a model response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Return the response text; the query is done
    Finish,
    /// Run the requested tools as round `round`, then call the model again
    ExecuteTools { round: u32, next_call: NextCall },
}

/// Decide what follows a model response.
///
/// `completed_rounds` counts tool rounds already executed for this query.
/// `tools_offered` is whether the call that produced the response carried
/// tool definitions; a response to a tool-less call is always final.
pub fn next_step(
    completed_rounds: u32,
    max_rounds: u32,
    tools_offered: bool,
    wants_tools: bool,
) -> Step {
    if !tools_offered || !wants_tools {
        return Step::Finish;
    }

    let round = completed_rounds + 1;
    let next_call = if round >= max_rounds {
        NextCall::WithoutTools
    } else {
        NextCall::WithTools
    };
    Step::ExecuteTools { round, next_call }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_response_finishes() {
        assert_eq!(next_step(0, 2, true, false), Step::Finish);
    }

    #[test]
    fn test_tool_less_call_is_final_even_if_model_asks() {
        assert_eq!(next_step(0, 2, false, true), Step::Finish);
        assert_eq!(next_step(2, 2, false, true), Step::Finish);
    }

    #[test]
    fn test_first_round_keeps_tools() {
        assert_eq!(
            next_step(0, 2, true, true),
            Step::ExecuteTools {
                round: 1,
                next_call: NextCall::WithTools
            }
        );
    }

    #[test]
    fn test_last_round_disables_tools() {
        assert_eq!(
            next_step(1, 2, true, true),
            Step::ExecuteTools {
                round: 2,
                next_call: NextCall::WithoutTools
            }
        );
        assert_eq!(
            next_step(0, 1, true, true),
            Step::ExecuteTools {
                round: 1,
                next_call: NextCall::WithoutTools
            }
        );
    }
}
