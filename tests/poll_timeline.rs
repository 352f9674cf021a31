//! Tests for polls in the timeline: voting, ending, server updates and the
//! failure alerts.
mod provider;

use std::sync::Arc;

use chat_screens::poll_timeline::{
    PollService, PollTimelineAction, PollTimelineAlert, PollTimelineOutcome, PollTimelineViewModel,
    PollTimelineViewState,
};
use chat_screens::{Config, ViewModel};

use crate::provider::{MockPollService, Recorder, background_runtime, sample_poll, settle};

type State = PollTimelineViewState;
type Outcome = PollTimelineOutcome;

fn view_model(
    service: &Arc<MockPollService>,
) -> (PollTimelineViewModel, Arc<Recorder<State, Outcome>>) {
    let service: Arc<dyn PollService> = service.clone();
    let view_model = PollTimelineViewModel::new("$poll:example.org", service, &Config::default());
    let recorder = Recorder::new();
    view_model.bind_view(&recorder);
    view_model.bind_coordinator(&recorder);
    (view_model, recorder)
}

#[tokio::test]
async fn starts_with_the_service_poll() {
    let service = MockPollService::new(sample_poll(false));
    let (view_model, recorder) = view_model(&service);

    assert_eq!(view_model.poll_start_event_id(), "$poll:example.org");
    assert_eq!(view_model.view_state().poll, sample_poll(false));
    assert_eq!(view_model.view_state().alert, None);
    assert!(recorder.states().is_empty());
}

#[tokio::test]
async fn selecting_an_answer_moves_the_vote_and_sends_it() {
    let service = MockPollService::new(sample_poll(false));
    let (view_model, recorder) = view_model(&service);

    view_model.process(PollTimelineAction::SelectAnswerOption("1".into()));

    let states = recorder.states();
    assert_eq!(states.len(), 1);
    let poll = &states[0].poll;
    assert_eq!(poll.selected_answer_ids(), vec!["1".to_string()]);
    assert_eq!(poll.answer_options[0].count, 11);
    assert_eq!(poll.answer_options[1].count, 4);
    assert_eq!(poll.total_answer_count, 30);

    settle(|| service.sent().len() == 1).await;
    assert_eq!(service.sent(), vec![vec!["1".to_string()]]);
}

// Quick changes of mind reach the server in the order they were made, so
// the server ends up with the vote the user sees.
#[tokio::test]
async fn rapid_selections_are_sent_in_order() {
    let service = MockPollService::new(sample_poll(false));
    let (view_model, _recorder) = view_model(&service);

    view_model.process(PollTimelineAction::SelectAnswerOption("1".into()));
    view_model.process(PollTimelineAction::SelectAnswerOption("3".into()));
    assert_eq!(view_model.view_state().poll.selected_answer_ids(), vec!["3".to_string()]);

    settle(|| service.sent().len() == 2).await;
    assert_eq!(service.sent(), vec![vec!["1".to_string()], vec!["3".to_string()]]);
}

#[test]
fn selection_from_a_thread_outside_the_runtime() {
    let runtime = background_runtime();
    let service = MockPollService::new(sample_poll(false));
    let (view_model, recorder) = runtime.block_on(async { view_model(&service) });

    std::thread::scope(|s| {
        s.spawn(|| {
            view_model.process(PollTimelineAction::SelectAnswerOption("1".into()));
            view_model.process(PollTimelineAction::EndPoll);
        });
    });

    let outcomes = runtime.block_on(recorder.wait_for_outcomes(1));
    assert_eq!(outcomes, vec![Outcome::Ended]);
    runtime.block_on(settle(|| service.sent().len() == 1));
    assert_eq!(service.sent(), vec![vec!["1".to_string()]]);
}

#[tokio::test]
async fn closed_poll_ignores_selection() {
    let service = MockPollService::new(sample_poll(true));
    let (view_model, recorder) = view_model(&service);

    view_model.process(PollTimelineAction::SelectAnswerOption("1".into()));
    view_model.process(PollTimelineAction::EndPoll);

    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(recorder.states().is_empty());
    assert!(service.sent().is_empty());
    assert_eq!(service.ended(), 0);
}

#[tokio::test]
async fn failed_vote_shows_alert_until_dismissed() {
    let service = MockPollService::new(sample_poll(false));
    service.fail_requests();
    let (view_model, recorder) = view_model(&service);

    view_model.process(PollTimelineAction::SelectAnswerOption("3".into()));
    let states = recorder.wait_for_states(2).await;
    assert_eq!(states[1].alert, Some(PollTimelineAlert::VoteNotRegistered));

    view_model.process(PollTimelineAction::DismissAlert);
    assert_eq!(view_model.view_state().alert, None);
    assert_eq!(recorder.states().len(), 3);

    // Nothing to dismiss any more.
    view_model.process(PollTimelineAction::DismissAlert);
    assert_eq!(recorder.states().len(), 3);
}

#[tokio::test]
async fn ending_the_poll_reports_ended() {
    let service = MockPollService::new(sample_poll(false));
    let (view_model, recorder) = view_model(&service);

    view_model.process(PollTimelineAction::EndPoll);
    let outcomes = recorder.wait_for_outcomes(1).await;
    assert_eq!(outcomes, vec![Outcome::Ended]);
    assert_eq!(service.ended(), 1);
}

#[tokio::test]
async fn ending_twice_sends_one_request() {
    let service = MockPollService::new(sample_poll(false));
    let (view_model, recorder) = view_model(&service);

    view_model.process(PollTimelineAction::EndPoll);
    view_model.process(PollTimelineAction::EndPoll);
    recorder.wait_for_outcomes(1).await;

    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(service.ended(), 1);
    assert_eq!(recorder.outcomes(), vec![Outcome::Ended]);
}

#[tokio::test]
async fn failed_end_can_be_retried() {
    let service = MockPollService::new(sample_poll(false));
    service.fail_requests();
    let (view_model, recorder) = view_model(&service);

    view_model.process(PollTimelineAction::EndPoll);
    recorder.wait_for_states(1).await;

    view_model.process(PollTimelineAction::EndPoll);
    settle(|| service.ended() == 2).await;
}

#[tokio::test]
async fn failed_end_shows_alert() {
    let service = MockPollService::new(sample_poll(false));
    service.fail_requests();
    let (view_model, recorder) = view_model(&service);

    view_model.process(PollTimelineAction::EndPoll);
    let states = recorder.wait_for_states(1).await;
    assert_eq!(states[0].alert, Some(PollTimelineAlert::NotClosed));
    assert!(recorder.outcomes().is_empty());
}

#[tokio::test]
async fn server_updates_replace_the_poll_and_keep_the_alert() {
    let service = MockPollService::new(sample_poll(false));
    let (view_model, recorder) = view_model(&service);

    view_model.show_closing_failure();
    service.push(sample_poll(true));

    let states = recorder.wait_for_states(2).await;
    assert!(states[1].poll.closed);
    assert_eq!(states[1].alert, Some(PollTimelineAlert::NotClosed));
    assert!(states[1].poll.shows_winner(&states[1].poll.answer_options[2]));
}

#[tokio::test]
async fn identical_updates_are_not_republished() {
    let service = MockPollService::new(sample_poll(false));
    let (view_model, recorder) = view_model(&service);

    view_model.update_with_poll(sample_poll(false));
    assert!(recorder.states().is_empty());

    view_model.show_answering_failure();
    assert_eq!(recorder.states().len(), 1);
    assert_eq!(recorder.states()[0].alert, Some(PollTimelineAlert::VoteNotRegistered));
}

#[tokio::test]
async fn state_serializes_for_the_shell() {
    let service = MockPollService::new(sample_poll(false));
    let (view_model, _recorder) = view_model(&service);

    let json = serde_json::to_value(view_model.view_state()).expect("should serialize");
    assert_eq!(json["poll"]["closed"], false);
    assert_eq!(json["poll"]["total_answer_count"], 30);
    assert_eq!(json["poll"]["kind"], "Disclosed");
    assert_eq!(json["poll"]["answer_options"][1]["selected"], true);
    assert!(json["alert"].is_null());
}
