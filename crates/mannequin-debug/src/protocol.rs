//! Tooling protocol - JSON command/response definitions

use serde::{Deserialize, Serialize};

/// Commands sent by preview tools
///
/// Actor and figurine identities travel as UUID strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "params")]
pub enum DebugCommand {
    /// Ping (health check)
    Ping,
    /// Names of every known pose
    ListPoses,
    /// Names of every known action
    ListActions,
    /// Registered figurine variants
    ListVariants,
    /// Select a pose or action for an actor, or clear it with `null`
    Select { actor: String, name: Option<String> },
    /// Current selection of an actor
    GetSelection { actor: String },
    /// Re-read one pose definition from disk
    ReloadPose { name: String },
    /// Re-read one action definition from disk
    ReloadAction { name: String },
    /// Pose of a pose or action at a given tick
    SamplePose { name: String, tick: u64 },
    /// Spawn a figurine of a registered variant
    SpawnFigurine { variant: String },
    /// Copy an actor's selection onto a spawned figurine
    ApplySelection { actor: String, figurine: String },
    /// Pose a figurine is currently showing
    GetFigurinePose { figurine: String },
    /// Persist a figurine's current pose as a new pose definition
    SavePose {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
        figurine: String,
    },
}

/// Responses from the tooling server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum DebugResponse {
    #[serde(rename = "ok")]
    Ok { data: ResponseData },
    #[serde(rename = "error")]
    Error { message: String },
}

/// Response data variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    None,
    Pong { message: String },
    Names { names: Vec<String> },
    Variants { variants: Vec<VariantInfo> },
    Selection {
        actor: String,
        selection: Option<String>,
    },
    Updated { description: String },
    PoseSample { name: String, parts: Vec<PartSample> },
    Spawned { figurine: String, variant: String },
    Saved { name: String, path: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantInfo {
    pub id: String,
    pub display_name: String,
    pub texture: String,
    pub slim: bool,
}

/// One body part of a sampled pose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartSample {
    pub part: String,
    pub rotation: [f32; 3],
    pub position: [f32; 3],
    pub scale: [f32; 3],
}

impl DebugResponse {
    pub fn ok(data: ResponseData) -> Self {
        Self::Ok { data }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error {
            message: msg.into(),
        }
    }

    pub fn pong() -> Self {
        Self::ok(ResponseData::Pong {
            message: "pong".into(),
        })
    }

    pub fn none() -> Self {
        Self::ok(ResponseData::None)
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_format() {
        let cmd: DebugCommand =
            serde_json::from_str(r#"{"cmd":"Select","params":{"actor":"a1","name":null}}"#).unwrap();
        assert_eq!(
            cmd,
            DebugCommand::Select {
                actor: "a1".into(),
                name: None
            }
        );

        let ping: DebugCommand = serde_json::from_str(r#"{"cmd":"Ping"}"#).unwrap();
        assert_eq!(ping, DebugCommand::Ping);

        let save: DebugCommand = serde_json::from_str(
            r#"{"cmd":"SavePose","params":{"name":"crouch","figurine":"f1"}}"#,
        )
        .unwrap();
        assert!(matches!(save, DebugCommand::SavePose { display_name: None, .. }));
    }

    #[test]
    fn test_response_wire_format() {
        let json = serde_json::to_value(DebugResponse::ok(ResponseData::Selection {
            actor: "a1".into(),
            selection: Some("wave".into()),
        }))
        .unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["data"]["selection"], "wave");

        let err = serde_json::to_value(DebugResponse::error("nope")).unwrap();
        assert_eq!(err["status"], "error");
        assert_eq!(err["message"], "nope");
    }

    #[test]
    fn test_untagged_data_reads_back() {
        for data in [
            ResponseData::None,
            ResponseData::Names {
                names: vec!["sit".into()],
            },
            ResponseData::Selection {
                actor: "a1".into(),
                selection: None,
            },
            ResponseData::Spawned {
                figurine: "f".into(),
                variant: "knight".into(),
            },
        ] {
            let line = serde_json::to_string(&DebugResponse::ok(data.clone())).unwrap();
            let back: DebugResponse = serde_json::from_str(&line).unwrap();
            assert_eq!(back, DebugResponse::ok(data));
        }
    }
}
