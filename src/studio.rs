//! Interactive preview surface
//!
//! The studio owns the pose and action libraries, the registered variants
//! and the spawned figurines. Tooling reaches it through `StudioHandler`,
//! the tick loop through `Studio::tick`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use mannequin_debug::{
    DebugCommand, DebugHandler, DebugResponse, PartSample, ResponseData, VariantInfo,
};
use uuid::Uuid;

use crate::animation::{ActionPlayer, Pose, STANDING_POSE_NAME};
use crate::core::{Error, MannequinConfig, Result};
use crate::figurine::{Animation, Figurine};
use crate::library::{install_defaults, ActionLibrary, LoadReport, PoseLibrary};
use crate::selection::{ActorId, SelectionStore};
use crate::variant::{
    discover_skins, DiscoveryOptions, MemoryHost, RegistrationReport, VariantRegistry,
};

/// What happened while opening a studio
#[derive(Debug, Default)]
pub struct StartupReport {
    /// Bundled definitions written on first run
    pub installed: Vec<PathBuf>,
    pub poses: LoadReport,
    pub actions: LoadReport,
    /// Skin files that did not become variants
    pub skipped_skins: usize,
    pub registration: RegistrationReport,
}

impl StartupReport {
    pub fn is_clean(&self) -> bool {
        self.poses.is_clean()
            && self.actions.is_clean()
            && self.skipped_skins == 0
            && self.registration.failed.is_empty()
    }
}

pub struct Studio {
    config: MannequinConfig,
    poses: PoseLibrary,
    actions: ActionLibrary,
    selections: Arc<SelectionStore>,
    registry: VariantRegistry,
    host: MemoryHost,
    figurines: HashMap<Uuid, Figurine>,
}

impl Studio {
    /// Run the whole startup sequence for `config`
    ///
    /// Skins are discovered on a loading thread while the libraries load.
    /// Registration then runs here, and the registry and host are sealed
    /// before returning.
    pub fn open(config: MannequinConfig, selections: Arc<SelectionStore>) -> Result<(Self, StartupReport)> {
        let mut report = StartupReport::default();

        let skins_dir = config.skins_path();
        let options = DiscoveryOptions::from_config(&config);
        let discovery = std::thread::spawn(move || discover_skins(&skins_dir, &options));

        report.installed = install_defaults(&config.poses_path(), &config.actions_path())?;
        let (poses, pose_report) = PoseLibrary::open(config.poses_path())?;
        if poses.cached(STANDING_POSE_NAME).is_none() {
            poses.insert(Pose::standing());
        }
        let (actions, action_report) = ActionLibrary::open(config.actions_path(), &poses)?;
        report.poses = pose_report;
        report.actions = action_report;

        let discovery = discovery
            .join()
            .map_err(|_| Error::format("skin discovery thread panicked"))??;
        report.skipped_skins = discovery.skipped.len();

        let mut registry = VariantRegistry::new();
        let mut host = MemoryHost::new();
        registry.accept(discovery)?;
        registry.validate()?;
        report.registration = registry.register_all(&mut host)?;
        registry.seal();
        host.freeze();

        let studio = Self {
            config,
            poses,
            actions,
            selections,
            registry,
            host,
            figurines: HashMap::new(),
        };
        Ok((studio, report))
    }

    pub fn config(&self) -> &MannequinConfig {
        &self.config
    }

    pub fn poses(&self) -> &PoseLibrary {
        &self.poses
    }

    pub fn actions(&self) -> &ActionLibrary {
        &self.actions
    }

    pub fn registry(&self) -> &VariantRegistry {
        &self.registry
    }

    pub fn host(&self) -> &MemoryHost {
        &self.host
    }

    /// Shared handle to the selection store
    pub fn selections(&self) -> Arc<SelectionStore> {
        self.selections.clone()
    }

    /// Look a name up as an action first, then as a pose
    ///
    /// Loaded definitions are checked before either library touches disk.
    pub fn resolve(&self, name: &str) -> Result<Animation> {
        if let Some(action) = self.actions.cached(name) {
            return Ok(Animation::Action(ActionPlayer::playing(action)));
        }
        if let Some(pose) = self.poses.cached(name) {
            return Ok(Animation::Pose(pose));
        }

        match self.actions.get(name, &self.poses) {
            Ok(action) => return Ok(Animation::Action(ActionPlayer::playing(action))),
            Err(e) if !e.is_not_found() => return Err(e),
            Err(_) => {}
        }
        match self.poses.get(name) {
            Ok(pose) => Ok(Animation::Pose(pose)),
            Err(e) if e.is_not_found() => Err(Error::not_found("pose or action", name)),
            Err(e) => Err(e),
        }
    }

    /// Select `name` for `actor`, or clear with `None`
    ///
    /// The name must resolve; a failed lookup leaves the selection as it was.
    pub fn select(&self, actor: ActorId, name: Option<&str>) -> Result<Option<String>> {
        match name {
            Some(name) => {
                self.resolve(name)?;
                self.selections.set(actor, name);
                Ok(Some(name.to_string()))
            }
            None => {
                self.selections.clear(&actor);
                Ok(None)
            }
        }
    }

    /// Pose of a pose or action at `tick`
    pub fn sample(&self, name: &str, tick: u64) -> Result<Pose> {
        match self.resolve(name)? {
            Animation::Pose(pose) => Ok(Pose::clone(&pose)),
            Animation::Action(player) => Ok(player.action().get_pose_at(tick)),
        }
    }

    /// Spawn a figurine through the host's factory for `variant`
    pub fn spawn(&mut self, variant: &str) -> Result<Uuid> {
        let figurine = self
            .host
            .spawn(variant)
            .ok_or_else(|| Error::not_found("variant", variant))?;
        let id = figurine.id();
        log::info!("Spawned figurine {} of variant '{}'", id, variant);
        self.figurines.insert(id, figurine);
        Ok(id)
    }

    pub fn figurine(&self, id: &Uuid) -> Option<&Figurine> {
        self.figurines.get(id)
    }

    pub fn figurine_count(&self) -> usize {
        self.figurines.len()
    }

    fn figurine_mut(&mut self, id: &Uuid) -> Result<&mut Figurine> {
        self.figurines
            .get_mut(id)
            .ok_or_else(|| Error::not_found("figurine", id.to_string()))
    }

    /// Copy the actor's current selection onto a figurine
    pub fn apply_selection(&mut self, actor: &ActorId, figurine: &Uuid) -> Result<String> {
        let name = self
            .selections
            .get(actor)
            .ok_or_else(|| Error::not_found("selection for actor", actor.to_string()))?;
        let animation = self.resolve(&name)?;

        let target = self.figurine_mut(figurine)?;
        match animation {
            Animation::Pose(pose) => target.set_pose(pose),
            Animation::Action(player) => target.play_action(player.action().clone()),
        }
        Ok(name)
    }

    /// Save what a figurine currently shows as a new pose definition
    pub fn save_pose(&self, name: &str, display_name: Option<String>, figurine: &Uuid) -> Result<PathBuf> {
        let source = self
            .figurine(figurine)
            .ok_or_else(|| Error::not_found("figurine", figurine.to_string()))?;
        let pose = source.current_pose().renamed(name, display_name);
        let path = self.poses.save(pose)?;
        log::info!("Saved pose '{}' to {}", name, path.display());
        Ok(path)
    }

    /// Advance every figurine by one tick
    pub fn tick(&mut self) {
        for figurine in self.figurines.values_mut() {
            figurine.tick();
        }
    }

    /// Execute one tooling command
    pub fn handle(&mut self, cmd: DebugCommand) -> Result<ResponseData> {
        match cmd {
            DebugCommand::Ping => Ok(ResponseData::Pong {
                message: "pong".into(),
            }),

            DebugCommand::ListPoses => Ok(ResponseData::Names {
                names: self.poses.names(),
            }),

            DebugCommand::ListActions => Ok(ResponseData::Names {
                names: self.actions.names(),
            }),

            DebugCommand::ListVariants => Ok(ResponseData::Variants {
                variants: self
                    .registry
                    .registered()
                    .map(|d| VariantInfo {
                        id: d.id.to_string(),
                        display_name: d.display_name.clone(),
                        texture: d.texture.path().display().to_string(),
                        slim: d.is_alternate_skeleton(),
                    })
                    .collect(),
            }),

            DebugCommand::Select { actor, name } => {
                let actor_id: ActorId = actor.parse()?;
                let selection = self.select(actor_id, name.as_deref())?;
                Ok(ResponseData::Selection { actor, selection })
            }

            DebugCommand::GetSelection { actor } => {
                let actor_id: ActorId = actor.parse()?;
                Ok(ResponseData::Selection {
                    selection: self.selections.get(&actor_id),
                    actor,
                })
            }

            DebugCommand::ReloadPose { name } => {
                self.poses.reload(&name)?;
                Ok(ResponseData::Updated {
                    description: format!("Reloaded pose '{}'", name),
                })
            }

            DebugCommand::ReloadAction { name } => {
                self.actions.reload(&name, &self.poses)?;
                Ok(ResponseData::Updated {
                    description: format!("Reloaded action '{}'", name),
                })
            }

            DebugCommand::SamplePose { name, tick } => {
                let pose = self.sample(&name, tick)?;
                Ok(pose_sample(&pose))
            }

            DebugCommand::SpawnFigurine { variant } => {
                let id = self.spawn(&variant)?;
                Ok(ResponseData::Spawned {
                    figurine: id.to_string(),
                    variant,
                })
            }

            DebugCommand::ApplySelection { actor, figurine } => {
                let actor_id: ActorId = actor.parse()?;
                let figurine_id = parse_figurine(&figurine)?;
                let name = self.apply_selection(&actor_id, &figurine_id)?;
                Ok(ResponseData::Updated {
                    description: format!("Figurine {} now shows '{}'", figurine, name),
                })
            }

            DebugCommand::GetFigurinePose { figurine } => {
                let figurine_id = parse_figurine(&figurine)?;
                let pose = self
                    .figurine(&figurine_id)
                    .ok_or_else(|| Error::not_found("figurine", figurine.as_str()))?
                    .current_pose();
                Ok(pose_sample(&pose))
            }

            DebugCommand::SavePose {
                name,
                display_name,
                figurine,
            } => {
                let figurine_id = parse_figurine(&figurine)?;
                let path = self.save_pose(&name, display_name, &figurine_id)?;
                Ok(ResponseData::Saved {
                    name,
                    path: path.display().to_string(),
                })
            }
        }
    }
}

fn parse_figurine(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|e| Error::format(format!("'{}' is not a figurine id: {}", raw, e)))
}

fn pose_sample(pose: &Pose) -> ResponseData {
    ResponseData::PoseSample {
        name: pose.name().to_string(),
        parts: pose
            .parts()
            .map(|(part, t)| PartSample {
                part: part.as_str().to_string(),
                rotation: t.rotation.to_array(),
                position: t.position.to_array(),
                scale: t.scale.to_array(),
            })
            .collect(),
    }
}

/// Tooling handler sharing the studio with the tick loop
pub struct StudioHandler {
    studio: Arc<Mutex<Studio>>,
}

impl StudioHandler {
    pub fn new(studio: Arc<Mutex<Studio>>) -> Self {
        Self { studio }
    }
}

impl DebugHandler for StudioHandler {
    fn handle_command(&mut self, cmd: DebugCommand) -> DebugResponse {
        let mut studio = self.studio.lock().unwrap_or_else(PoisonError::into_inner);
        match studio.handle(cmd) {
            Ok(data) => DebugResponse::ok(data),
            Err(e) => {
                log::warn!("Tooling command failed: {}", e);
                DebugResponse::error(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::PartName;
    use tempfile::TempDir;

    struct Fixture {
        temp_dir: TempDir,
        studio: Studio,
        report: StartupReport,
    }

    fn write_skin(dir: &std::path::Path, name: &str) {
        std::fs::create_dir_all(dir).unwrap();
        image::RgbaImage::new(64, 64)
            .save_with_format(dir.join(name), image::ImageFormat::Png)
            .expect("write skin");
    }

    fn fixture() -> Fixture {
        crate::core::logging::init_for_tests();
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let config = MannequinConfig::with_root(temp_dir.path());
        write_skin(&config.skins_path(), "knight.png");
        write_skin(&config.skins_path(), "Alex_slim.png");

        let (studio, report) = Studio::open(config, Arc::new(SelectionStore::new())).expect("open studio");
        Fixture {
            temp_dir,
            studio,
            report,
        }
    }

    fn ok(response: Result<ResponseData>) -> ResponseData {
        response.expect("command should succeed")
    }

    #[test]
    fn test_startup_installs_and_registers() {
        let fx = fixture();
        assert!(fx.report.is_clean());
        assert!(!fx.report.installed.is_empty());
        assert!(fx.studio.poses().cached("standing").is_some());
        assert!(fx.studio.actions().cached("wave").is_some());

        let ids: Vec<_> = fx.studio.registry().registered().map(|d| d.id.to_string()).collect();
        assert_eq!(ids, vec!["alex_slim", "knight"]);
        assert_eq!(fx.studio.host().numeric_id("knight"), Some(1));
        assert!(fx.studio.host().is_frozen());
    }

    #[test]
    fn test_select_validates_names() {
        let fx = fixture();
        let actor = ActorId::new();

        assert_eq!(fx.studio.select(actor, Some("wave")).unwrap().as_deref(), Some("wave"));
        assert_eq!(fx.studio.select(actor, Some("sitting")).unwrap().as_deref(), Some("sitting"));

        let err = fx.studio.select(actor, Some("moonwalk")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(fx.studio.selections().get(&actor).as_deref(), Some("sitting"));

        fx.studio.select(actor, None).unwrap();
        assert_eq!(fx.studio.selections().get(&actor), None);
    }

    #[test]
    fn test_apply_selection_and_tick() {
        let mut fx = fixture();
        let actor = ActorId::new();
        let figurine = fx.studio.spawn("knight").unwrap();

        // Nothing applied yet
        let pose = fx.studio.figurine(&figurine).unwrap().current_pose();
        assert!(pose.abs_diff_eq(&Pose::standing(), 1e-6));

        fx.studio.select(actor, Some("walk")).unwrap();
        assert_eq!(fx.studio.apply_selection(&actor, &figurine).unwrap(), "walk");
        for _ in 0..5 {
            fx.studio.tick();
        }
        let shown = fx.studio.figurine(&figurine).unwrap().current_pose();
        assert_eq!(shown.name(), "walk");
        assert!(shown.abs_diff_eq(&fx.studio.sample("walk", 5).unwrap(), 1e-6));

        let stranger = ActorId::new();
        assert!(fx.studio.apply_selection(&stranger, &figurine).is_err());
        assert!(fx.studio.spawn("dragon").is_err());
    }

    #[test]
    fn test_save_pose_from_figurine() {
        let mut fx = fixture();
        let actor = ActorId::new();
        let figurine = fx.studio.spawn("alex_slim").unwrap();
        fx.studio.select(actor, Some("waving")).unwrap();
        fx.studio.apply_selection(&actor, &figurine).unwrap();

        let path = fx
            .studio
            .save_pose("my_wave", Some("My Wave".into()), &figurine)
            .unwrap();
        assert!(path.starts_with(fx.temp_dir.path()));

        let saved = fx.studio.poses().reload("my_wave").unwrap();
        let waving = fx.studio.poses().get("waving").unwrap();
        assert_eq!(saved.display_name(), "My Wave");
        assert!(saved.abs_diff_eq(&waving, 1e-6));
    }

    #[test]
    fn test_command_dispatch() {
        let mut fx = fixture();
        let actor = ActorId::new().to_string();

        match ok(fx.studio.handle(DebugCommand::ListPoses)) {
            ResponseData::Names { names } => assert!(names.contains(&"standing".to_string())),
            other => panic!("unexpected {:?}", other),
        }

        match ok(fx.studio.handle(DebugCommand::ListVariants)) {
            ResponseData::Variants { variants } => {
                assert_eq!(variants.len(), 2);
                assert!(variants[0].slim);
                assert_eq!(variants[0].display_name, "Alex");
            }
            other => panic!("unexpected {:?}", other),
        }

        ok(fx.studio.handle(DebugCommand::Select {
            actor: actor.clone(),
            name: Some("sitting".into()),
        }));
        match ok(fx.studio.handle(DebugCommand::GetSelection { actor: actor.clone() })) {
            ResponseData::Selection { selection, .. } => assert_eq!(selection.as_deref(), Some("sitting")),
            other => panic!("unexpected {:?}", other),
        }

        let figurine = match ok(fx.studio.handle(DebugCommand::SpawnFigurine {
            variant: "knight".into(),
        })) {
            ResponseData::Spawned { figurine, .. } => figurine,
            other => panic!("unexpected {:?}", other),
        };
        ok(fx.studio.handle(DebugCommand::ApplySelection {
            actor: actor.clone(),
            figurine: figurine.clone(),
        }));

        match ok(fx.studio.handle(DebugCommand::GetFigurinePose { figurine })) {
            ResponseData::PoseSample { name, parts } => {
                assert_eq!(name, "sitting");
                assert_eq!(parts.len(), 7);
                assert_eq!(parts[0].part, PartName::Head.as_str());
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(fx.studio.handle(DebugCommand::GetSelection { actor: "bogus".into() }).is_err());
        assert!(fx.studio.handle(DebugCommand::ReloadPose { name: "nowhere".into() }).is_err());
    }

    #[test]
    fn test_failed_reload_keeps_old_pose() {
        let mut fx = fixture();
        let before = fx.studio.poses().get("sitting").unwrap();
        std::fs::write(
            fx.studio.config().poses_path().join("sitting.json"),
            r#"{ "name": "sitting", "head": { "rotation": [0.1, 0.2] } }"#,
        )
        .unwrap();

        let result = fx.studio.handle(DebugCommand::ReloadPose {
            name: "sitting".into(),
        });
        assert!(matches!(result, Err(Error::Format(_))));
        assert!(Arc::ptr_eq(&before, &fx.studio.poses().get("sitting").unwrap()));
    }

    #[test]
    fn test_loaded_pose_resolves_without_reading_actions() {
        let fx = fixture();
        // An unreadable action file added after startup is never consulted for a loaded pose
        std::fs::write(fx.studio.config().actions_path().join("sitting.json"), "{ broken").unwrap();

        assert!(matches!(fx.studio.resolve("sitting"), Ok(Animation::Pose(_))));
        assert!(matches!(fx.studio.resolve("wave"), Ok(Animation::Action(_))));
        assert!(matches!(fx.studio.resolve("moonwalk"), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_colliding_skins_register_once() {
        crate::core::logging::init_for_tests();
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let config = MannequinConfig::with_root(temp_dir.path());
        write_skin(&config.skins_path(), "steve_hat.png");
        write_skin(&config.skins_path(), "Steve Hat.png");

        let (studio, report) = Studio::open(config, Arc::new(SelectionStore::new())).expect("open studio");
        assert_eq!(studio.host().len(), 1);
        assert_eq!(report.skipped_skins, 1);
        assert_eq!(report.registration.registered.len(), 1);
        assert!(studio.host().numeric_id("steve_hat").is_some());
    }

    #[test]
    fn test_handler_reports_errors() {
        let fx = fixture();
        let studio = Arc::new(Mutex::new(fx.studio));
        let mut handler = StudioHandler::new(studio);

        assert_eq!(handler.handle_command(DebugCommand::Ping), DebugResponse::pong());
        let response = handler.handle_command(DebugCommand::SamplePose {
            name: "moonwalk".into(),
            tick: 0,
        });
        assert_eq!(
            response,
            DebugResponse::error("Unknown pose or action 'moonwalk'")
        );
    }
}
