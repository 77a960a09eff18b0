use gg_core::{ChatView, EngineOutput, SceneKind, SceneView};

use crate::{json_string, BoundaryEvent, BoundaryResult};

fn scene_event(view: &SceneView) -> BoundaryEvent {
    match view.kind {
        SceneKind::Choice => BoundaryEvent::Choices,
        SceneKind::Input => BoundaryEvent::Input,
        _ => BoundaryEvent::Scene,
    }
}

pub(crate) fn boundary_from_output(output: EngineOutput) -> BoundaryResult {
    match output {
        EngineOutput::Scene(view) => BoundaryResult {
            event: scene_event(&view),
            scene_id: Some(view.scene_id),
            title: view.title,
            speaker: Some(view.speaker),
            texts: vec![view.text],
            background: view.background.map(|asset| asset.path),
            sprite: view.sprite.map(|sprite| sprite.path),
            hint: Some(view.hint).filter(|hint| !hint.is_empty()),
            choices: view
                .choices
                .into_iter()
                .map(|item| (item.index, item.text))
                .collect(),
            input_placeholder: view.input_placeholder,
            emotion: None,
            affection: Some(view.affection),
            affection_gain: None,
        },
        EngineOutput::FreeChat(view) => BoundaryResult {
            speaker: Some(view.speaker),
            texts: vec![view.intro],
            background: view.background.map(|asset| asset.path),
            sprite: view.sprite.map(|sprite| sprite.path),
            hint: Some(view.hint),
            affection: Some(view.affection),
            ..BoundaryResult::empty(BoundaryEvent::FreeChat)
        },
        EngineOutput::Unchanged => BoundaryResult::empty(BoundaryEvent::Unchanged),
        EngineOutput::Ended { message } => BoundaryResult {
            texts: vec![message],
            ..BoundaryResult::empty(BoundaryEvent::End)
        },
    }
}

pub(crate) fn boundary_from_chat(view: ChatView) -> BoundaryResult {
    BoundaryResult {
        speaker: Some(view.speaker),
        texts: vec![view.reply],
        sprite: view.sprite.map(|sprite| sprite.path),
        emotion: Some(view.emotion),
        affection: Some(view.affection),
        affection_gain: Some(view.affection_gain),
        ..BoundaryResult::empty(BoundaryEvent::Chat)
    }
}

pub(crate) fn boundary_lines(boundary: &BoundaryResult, state_out: Option<&str>) -> Vec<String> {
    let mut lines = vec![
        "RESULT:OK".to_string(),
        format!("EVENT:{}", boundary.event.label()),
    ];

    if let Some(scene_id) = boundary.scene_id {
        lines.push(format!("SCENE:{}", scene_id));
    }
    if let Some(title) = &boundary.title {
        lines.push(format!("TITLE_JSON:{}", json_string(title)));
    }
    if let Some(speaker) = &boundary.speaker {
        lines.push(format!("SPEAKER_JSON:{}", json_string(speaker)));
    }
    for text in &boundary.texts {
        lines.push(format!("TEXT_JSON:{}", json_string(text)));
    }
    if let Some(background) = &boundary.background {
        lines.push(format!("BACKGROUND:{}", background));
    }
    if let Some(sprite) = &boundary.sprite {
        lines.push(format!("SPRITE:{}", sprite));
    }
    if let Some(hint) = &boundary.hint {
        lines.push(format!("HINT_JSON:{}", json_string(hint)));
    }
    for (index, text) in &boundary.choices {
        lines.push(format!("CHOICE:{}|{}", index, json_string(text)));
    }
    if let Some(placeholder) = &boundary.input_placeholder {
        lines.push(format!(
            "INPUT_PLACEHOLDER_JSON:{}",
            json_string(placeholder)
        ));
    }
    if let Some(emotion) = &boundary.emotion {
        lines.push(format!("EMOTION:{}", emotion));
    }
    if let Some(affection) = boundary.affection {
        lines.push(format!("AFFECTION:{}", affection));
    }
    if let Some(gain) = boundary.affection_gain {
        lines.push(format!("AFFECTION_GAIN:{}", gain));
    }
    lines.push(format!("STATE_OUT:{}", state_out.unwrap_or("NONE")));
    lines
}

pub(crate) fn emit_boundary(boundary: &BoundaryResult, state_out: Option<&str>) {
    for line in boundary_lines(boundary, state_out) {
        println!("{}", line);
    }
}
