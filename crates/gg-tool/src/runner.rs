use std::path::Path;

use gg_api::{create_engine_from_bundle, load_chat_lexicon};
use gg_chat::{ChatBridge, ScriptedTransport, SeededRandom};
use gg_core::{EngineOutput, SceneKind};
use gg_runtime::{parse_free_chat_input, FreeChatCommand};

use crate::source::{load_case_bundle, read_test_case};
use crate::{ExpectedEvent, GgToolError, TestAction, TestCase};

const MAX_STEPS: usize = 5_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub observed_events: Vec<ExpectedEvent>,
    pub consumed_actions: usize,
    pub steps: usize,
}

/// What the last observed output is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Waiting {
    Advance,
    Ending,
    Choice,
    Input,
    FreeChat,
    Ended,
}

fn observe(output: EngineOutput, observed: &mut Vec<ExpectedEvent>, previous: Waiting) -> Waiting {
    match output {
        EngineOutput::Scene(view) => match view.kind {
            SceneKind::Choice => {
                observed.push(ExpectedEvent::Choices {
                    scene_id: view.scene_id,
                    text: view.text,
                    choices: view.choices.into_iter().map(|item| item.text).collect(),
                });
                Waiting::Choice
            }
            SceneKind::Input => {
                observed.push(ExpectedEvent::Input {
                    scene_id: view.scene_id,
                    text: view.text,
                    placeholder: view.input_placeholder,
                });
                Waiting::Input
            }
            kind => {
                observed.push(ExpectedEvent::Scene {
                    scene_id: view.scene_id,
                    speaker: view.speaker,
                    text: view.text,
                });
                if kind == SceneKind::Ending {
                    Waiting::Ending
                } else {
                    Waiting::Advance
                }
            }
        },
        EngineOutput::FreeChat(view) => {
            observed.push(ExpectedEvent::FreeChat {
                intro: view.intro,
                affection: view.affection,
            });
            Waiting::FreeChat
        }
        EngineOutput::Unchanged => {
            observed.push(ExpectedEvent::Unchanged);
            previous
        }
        EngineOutput::Ended { .. } => {
            observed.push(ExpectedEvent::End);
            Waiting::Ended
        }
    }
}

fn next_action<'a>(
    case: &'a TestCase,
    action_index: usize,
    event_index: usize,
    expected_action_kind: &str,
) -> Result<&'a TestAction, GgToolError> {
    case.actions
        .get(action_index)
        .ok_or_else(|| GgToolError::MissingAction {
            event_index,
            expected_action_kind: expected_action_kind.to_string(),
        })
}

fn kind_mismatch(event_index: usize, expected: &str, action: &TestAction) -> GgToolError {
    GgToolError::ActionKindMismatch {
        event_index,
        expected_action_kind: expected.to_string(),
        actual_action_kind: action.kind_name().to_string(),
    }
}

/// Plays `case` against the bundle in `example_dir`. Non-interactive scenes
/// advance on their own; choices, inputs and free chat consume one action
/// each. The run stops at an ending scene or in free chat once every action
/// is used, or when the engine reports the story ended.
pub fn run_case(example_dir: &Path, case: &TestCase) -> Result<RunReport, GgToolError> {
    let bundle = load_case_bundle(example_dir, case)?;
    let mut engine = create_engine_from_bundle(&bundle).map_err(GgToolError::Bundle)?;
    let lexicon = load_chat_lexicon(&bundle).map_err(GgToolError::Bundle)?;
    let mut bridge = ChatBridge::new(
        Box::new(ScriptedTransport::new(case.chat_replies.clone())),
        lexicon,
        Box::new(SeededRandom::new(case.seed)),
    );

    let mut observed_events = Vec::new();
    let mut action_index = 0usize;
    let mut waiting = observe(engine.start()?, &mut observed_events, Waiting::Advance);

    for step in 1..=MAX_STEPS {
        let exhausted = action_index == case.actions.len();
        let event_index = observed_events.len().saturating_sub(1);
        match waiting {
            Waiting::Ended => {
                if !exhausted {
                    return Err(GgToolError::UnusedActions {
                        used: action_index,
                        total: case.actions.len(),
                    });
                }
                return Ok(RunReport {
                    observed_events,
                    consumed_actions: action_index,
                    steps: step,
                });
            }
            Waiting::Ending | Waiting::FreeChat if exhausted => {
                return Ok(RunReport {
                    observed_events,
                    consumed_actions: action_index,
                    steps: step,
                });
            }
            Waiting::Advance | Waiting::Ending => {
                waiting = observe(engine.advance()?, &mut observed_events, waiting);
            }
            Waiting::Choice => {
                let action = next_action(case, action_index, event_index, "choose")?;
                let TestAction::Choose { index } = action else {
                    return Err(kind_mismatch(event_index, "choose", action));
                };
                waiting = observe(engine.choose(*index)?, &mut observed_events, waiting);
                action_index += 1;
            }
            Waiting::Input => {
                let action = next_action(case, action_index, event_index, "input")?;
                let TestAction::Input { text } = action else {
                    return Err(kind_mismatch(event_index, "input", action));
                };
                waiting = observe(engine.submit_input(text)?, &mut observed_events, waiting);
                action_index += 1;
            }
            Waiting::FreeChat => {
                let action = next_action(case, action_index, event_index, "chat")?;
                let TestAction::Chat { text } = action else {
                    return Err(kind_mismatch(event_index, "chat", action));
                };
                action_index += 1;
                match parse_free_chat_input(text) {
                    FreeChatCommand::Restart => {
                        waiting = observe(engine.restart()?, &mut observed_events, waiting);
                    }
                    FreeChatCommand::Empty => {
                        observed_events.push(ExpectedEvent::Unchanged);
                    }
                    FreeChatCommand::Message(message) => {
                        let outcome = bridge.send(&message);
                        let view = engine.apply_chat(
                            &outcome.reply,
                            &outcome.emotion,
                            outcome.affection_delta,
                        )?;
                        observed_events.push(ExpectedEvent::Chat {
                            reply: view.reply,
                            affection: view.affection,
                        });
                    }
                }
            }
        }
    }

    Err(GgToolError::GuardExceeded {
        max_steps: MAX_STEPS,
    })
}

pub fn assert_case(example_dir: &Path, case_path: &Path) -> Result<(), GgToolError> {
    let case = read_test_case(case_path)?;
    let report = run_case(example_dir, &case)?;

    if report.observed_events.len() != case.expected_events.len() {
        let observed = serde_json::to_string_pretty(&report.observed_events)
            .map_err(GgToolError::EventSerialize)?;
        return Err(GgToolError::EventCountMismatch {
            expected: case.expected_events.len(),
            actual: report.observed_events.len(),
            observed,
        });
    }

    for (index, (expected, actual)) in case
        .expected_events
        .iter()
        .zip(report.observed_events.iter())
        .enumerate()
    {
        if expected != actual {
            let expected = serde_json::to_string(expected).map_err(GgToolError::EventSerialize)?;
            let actual = serde_json::to_string(actual).map_err(GgToolError::EventSerialize)?;
            return Err(GgToolError::EventMismatch {
                index,
                expected,
                actual,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod runner_tests {
    use super::*;
    use crate::source::source_test_support::*;
    use crate::TESTCASE_SCHEMA_V1;

    fn case(actions: Vec<TestAction>) -> TestCase {
        TestCase {
            schema_version: TESTCASE_SCHEMA_V1.to_string(),
            entry_script: None,
            seed: 1,
            chat_replies: Vec::new(),
            actions,
            expected_events: Vec::new(),
        }
    }

    fn scene(id: u32, text: &str) -> ExpectedEvent {
        ExpectedEvent::Scene {
            scene_id: id,
            speaker: "系统".to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn run_case_stops_at_ending_without_actions() {
        let root = temp_dir("ending");
        write_bundle(
            &root,
            r#"[{"id":1,"text":"a"},{"id":2,"type":"ending","text":"b"}]"#,
        );

        let report = run_case(&root, &case(Vec::new())).expect("run should pass");
        assert_eq!(report.observed_events, vec![scene(1, "a"), scene(2, "b")]);
        assert_eq!(report.consumed_actions, 0);
    }

    #[test]
    fn run_case_consumes_input_choice_and_chat_actions() {
        let root = temp_dir("boundaries");
        write_bundle(
            &root,
            r#"[
  {"id":1,"type":"input","text":"name?","input_variable":"player_name","placeholder":"名字"},
  {"id":2,"text":"hi {player_name}"},
  {"id":3,"type":"choice","text":"pick","choices":[{"text":"chat","next":"free_chat","affection":2}]}
]"#,
        );

        let mut case = case(vec![
            TestAction::Input {
                text: "Rin".to_string(),
            },
            TestAction::Choose { index: 0 },
            TestAction::Chat {
                text: "今天下雨了".to_string(),
            },
        ]);
        case.chat_replies = vec![Some("嗯。[EMOTION_SCORE:0.9]".to_string())];

        let report = run_case(&root, &case).expect("run should pass");
        assert_eq!(report.consumed_actions, 3);
        assert_eq!(
            report.observed_events,
            vec![
                ExpectedEvent::Input {
                    scene_id: 1,
                    text: "name?".to_string(),
                    placeholder: Some("名字".to_string()),
                },
                scene(2, "hi Rin"),
                ExpectedEvent::Choices {
                    scene_id: 3,
                    text: "pick".to_string(),
                    choices: vec!["chat".to_string()],
                },
                ExpectedEvent::FreeChat {
                    intro: String::new(),
                    affection: 2,
                },
                ExpectedEvent::Chat {
                    reply: "嗯。".to_string(),
                    affection: 3,
                },
            ]
        );
    }

    #[test]
    fn restart_keyword_in_free_chat_starts_over() {
        let root = temp_dir("restart");
        write_bundle(
            &root,
            r#"[{"id":1,"text":"a"},{"id":2,"type":"free_chat","text":"聊吧"}]"#,
        );

        let report = run_case(
            &root,
            &case(vec![
                TestAction::Chat {
                    text: "谢谢你".to_string(),
                },
                TestAction::Chat {
                    text: "  Restart ".to_string(),
                },
            ]),
        )
        .expect("run should pass");

        let events = &report.observed_events;
        assert_eq!(events.len(), 5);
        assert_eq!(events[0], scene(1, "a"));
        assert_eq!(
            events[1],
            ExpectedEvent::FreeChat {
                intro: "聊吧".to_string(),
                affection: 0,
            }
        );
        assert!(matches!(events[2], ExpectedEvent::Chat { affection: 1, .. }));
        assert_eq!(events[3], scene(1, "a"));
        assert_eq!(events[4], events[1]);
    }

    #[test]
    fn run_case_reports_missing_or_wrong_action_kinds() {
        let root = temp_dir("missing-action");
        write_bundle(
            &root,
            r#"[{"id":1,"type":"choice","text":"pick","choices":[{"text":"A","next":1}]}]"#,
        );

        let missing = run_case(&root, &case(Vec::new())).expect_err("missing action");
        assert!(matches!(missing, GgToolError::MissingAction { .. }));

        let wrong = run_case(
            &root,
            &case(vec![TestAction::Input {
                text: "x".to_string(),
            }]),
        )
        .expect_err("kind mismatch");
        assert!(matches!(
            wrong,
            GgToolError::ActionKindMismatch { ref actual_action_kind, .. } if actual_action_kind == "input"
        ));

        let out_of_range =
            run_case(&root, &case(vec![TestAction::Choose { index: 9 }])).expect_err("index");
        assert!(matches!(
            out_of_range,
            GgToolError::Engine(ref inner) if inner.code == "ENGINE_CHOICE_INDEX"
        ));
    }

    #[test]
    fn run_case_reports_unused_actions_after_end() {
        let root = temp_dir("unused");
        write_bundle(&root, r#"[{"id":2,"text":"orphan"}]"#);

        let report = run_case(&root, &case(Vec::new())).expect("run should pass");
        assert_eq!(report.observed_events, vec![ExpectedEvent::End]);

        let error = run_case(&root, &case(vec![TestAction::Choose { index: 0 }]))
            .expect_err("unused action");
        assert!(matches!(
            error,
            GgToolError::UnusedActions { used: 0, total: 1 }
        ));
    }

    #[test]
    fn run_case_reports_guard_exceeded() {
        let root = temp_dir("guard");
        write_bundle(&root, r#"[{"id":1,"text":"tick","next":1}]"#);

        let error = run_case(&root, &case(Vec::new())).expect_err("guard should fail");
        assert!(matches!(error, GgToolError::GuardExceeded { .. }));
    }

    #[test]
    fn assert_case_reports_count_and_value_mismatches() {
        let root = temp_dir("assert");
        write_bundle(&root, r#"[{"id":1,"type":"ending","text":"Hello"}]"#);

        let count_case = root.join("count.json");
        write_file(
            &count_case,
            r#"{"schemaVersion":"gg-tool-case.v1","expectedEvents":[]}"#,
        );
        let count_error = assert_case(&root, &count_case).expect_err("count mismatch");
        assert!(matches!(
            count_error,
            GgToolError::EventCountMismatch { .. }
        ));

        let value_case = root.join("value.json");
        write_file(
            &value_case,
            r#"{"schemaVersion":"gg-tool-case.v1","expectedEvents":[{"kind":"scene","sceneId":1,"speaker":"系统","text":"Wrong"}]}"#,
        );
        let value_error = assert_case(&root, &value_case).expect_err("value mismatch");
        assert!(matches!(value_error, GgToolError::EventMismatch { .. }));

        let pass_case = root.join("pass.json");
        write_file(
            &pass_case,
            r#"{"schemaVersion":"gg-tool-case.v1","expectedEvents":[{"kind":"scene","sceneId":1,"speaker":"系统","text":"Hello"}]}"#,
        );
        assert_case(&root, &pass_case).expect("assert should pass");
    }
}
