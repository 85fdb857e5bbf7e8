//! NovaEngine demo: a menu and a small arena.
//!
//! Move with WASD or the arrows, collect the gold squares, click to shoot
//! (costs energy, which refills over time). Escape goes back to the menu,
//! Escape again quits. The best score is kept in the save file.
//!
//! An optional `nova_demo.json` next to the executable's working directory
//! overrides the window settings (see `EngineConfig`).

use glam::Vec2;
use nova_core::{AttributeError, AttributeRegistry, Color, Key, Rect, SaveLocation, SaveManager};
use nova_game::{
    load_config_from_path, Button, Engine, EngineConfig, Projectile, ProgressBar, Scene, Sprite,
    TextLabel, TopDownMovement,
};
use rand::Rng;
use std::path::Path;
use std::time::Duration;

const CONFIG_PATH: &str = "nova_demo.json";
const SHOT_COST: f64 = 5.0;
const COIN_ENERGY: f64 = 10.0;
const MAX_ENERGY: f64 = 100.0;

#[derive(Default)]
struct Demo {
    score: u32,
    best: u32,
    energy: f64,
}

fn register_attributes(registry: &mut AttributeRegistry<Demo>) -> Result<(), AttributeError> {
    registry
        .field("demo.score", |d: &Demo| Some(&d.score), |d: &mut Demo| Some(&mut d.score))?
        .field("demo.best", |d: &Demo| Some(&d.best), |d: &mut Demo| Some(&mut d.best))?
        .field("demo.energy", |d: &Demo| Some(&d.energy), |d: &mut Demo| Some(&mut d.energy))?;
    Ok(())
}

fn menu_scene() -> Scene<Demo> {
    let mut scene: Scene<Demo> = Scene::new("menu");
    let mut play = Button::from_sprite(Sprite::blank(160.0, 50.0, false).with_fill(Color::rgb(70, 130, 180)));
    let mut best = TextLabel::new(Vec2::ZERO, "Best: ").bind("demo.best");
    best.centered = true;
    best.size = 24.0;

    scene.set_logic(move |_, frame| {
        let center = frame.ctx.screen.center();
        play.sprite.place_centered(center);
        if play.check(frame.ctx) {
            frame.state.score = 0;
            frame.ctx.switch_scene("arena");
        }
        frame
            .ctx
            .render_text("Play", center, 24.0, Color::WHITE, true);

        best.pos = center - Vec2::new(0.0, 80.0);
        best.update(frame);

        if frame.ctx.key_pressed(Key::Escape) {
            frame.ctx.quit();
        }
    });
    scene
}

fn wall(x: f32, y: f32, w: f32, h: f32) -> Sprite {
    let mut sprite = Sprite::blank(w, h, true).with_fill(Color::GRAY);
    sprite.set_position(x, y);
    sprite
}

fn arena_scene() -> Scene<Demo> {
    let mut scene: Scene<Demo> = Scene::new("arena");

    let mut player = Sprite::blank(30.0, 30.0, false).with_fill(Color::BLUE);
    player.set_position(40.0, 60.0);
    let player = scene.add_sprite(player);

    scene.add_sprites([
        wall(150.0, 120.0, 20.0, 220.0),
        wall(330.0, 120.0, 20.0, 220.0),
    ]);

    let mut coin = Sprite::blank(12.0, 12.0, false).with_fill(Color::rgb(255, 200, 0));
    coin.set_position(240.0, 80.0);
    coin.set_collide_immunity(0.0);
    let coin = scene.add_sprite(coin);

    let movement = TopDownMovement::new(220.0);
    let mut energy = ProgressBar::new(Rect::new(10.0, 10.0, 150.0, 16.0), MAX_ENERGY, MAX_ENERGY).bind("demo.energy");
    let mut score = TextLabel::new(Vec2::new(180.0, 10.0), "Score: ").bind("demo.score");
    let mut shots: Vec<Projectile> = Vec::new();
    let mut rng = rand::rng();

    scene.set_logic(move |scene, frame| {
        let solids = scene.solid_rects_except(player);
        if let Some(sprite) = scene.get_mut(player) {
            movement.apply(sprite, frame.ctx, &solids);
        }
        let player_rect = scene.get(player).map(|s| s.rect);

        if let (Some(rect), Some(c)) = (player_rect, scene.get_mut(coin)) {
            if c.collide_rect(&rect) {
                let state = &mut *frame.state;
                state.score += 1;
                state.best = state.best.max(state.score);
                state.energy = (state.energy + COIN_ENERGY).min(MAX_ENERGY);

                let screen = frame.ctx.screen;
                let x = rng.random_range(0.0..(screen.w - c.rect.w).max(1.0));
                let y = rng.random_range(40.0..(screen.h - c.rect.h).max(41.0));
                c.set_position(x, y);
            }
        }

        if frame.ctx.mouse_clicked() && frame.state.energy >= SHOT_COST {
            if let Some(rect) = player_rect {
                let bullet = Sprite::blank(6.0, 6.0, false).with_fill(Color::RED);
                shots.push(Projectile::new(bullet, rect.center(), frame.ctx.mouse_pos(), 400.0));
                frame.state.energy -= SHOT_COST;
            }
        }

        scene.update(frame.ctx);
        for shot in &mut shots {
            shot.update(frame.ctx);
        }
        shots.retain(Projectile::alive);

        energy.update(frame);
        score.update(frame);

        if frame.ctx.key_pressed(Key::Escape) {
            frame.ctx.switch_scene("menu");
        }
    });
    scene
}

fn load_config() -> EngineConfig {
    let path = Path::new(CONFIG_PATH);
    if path.exists() {
        match load_config_from_path(path) {
            Ok(config) => return config,
            Err(e) => log::warn!("{}; using defaults", e),
        }
    }
    EngineConfig {
        app_name: "Nova Demo".to_string(),
        ..EngineConfig::default()
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config();
    let app_name = config.app_name.clone();
    let mut engine = Engine::new(
        config,
        Demo {
            energy: MAX_ENERGY,
            ..Demo::default()
        },
    );

    if let Err(e) = register_attributes(engine.attributes_mut()) {
        log::error!("{}", e);
        std::process::exit(1);
    }

    match SaveManager::new(&app_name, SaveLocation::app_data(), "progress") {
        Ok(mut saves) => {
            saves.set_vars(["demo.best"]);
            engine.set_save_manager(saves);
        }
        Err(e) => log::warn!(target: "SaveManager", "Saving disabled: {}", e),
    }

    engine.scene(menu_scene()).scene(arena_scene());
    engine.every(Duration::from_secs(1), |frame| {
        frame.state.energy = (frame.state.energy + 2.0).min(MAX_ENERGY);
    });

    if let Err(e) = engine.run(Some("menu")) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
