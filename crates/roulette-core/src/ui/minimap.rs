//! Scaled overview of the stage in the top-left corner.

use super::{PointerKind, UiAction, UiObject};
use crate::marble::MarbleDrawOptions;
use crate::render::{Canvas, Rect, RenderParams, draw_entity};

/// Pixels per world unit.
const MINIMAP_SCALE: f32 = 4.0;
const OFFSET: f32 = 10.0;

#[derive(Debug, Default)]
pub struct Minimap {
    /// World-space stage bounds as of the last render.
    world: Option<Rect>,
    dragging: bool,
    actions: Vec<UiAction>,
}

impl Minimap {
    pub fn new() -> Self {
        Self::default()
    }

    /// World position under a screen position.
    pub fn screen_to_world(&self, position: [f32; 2]) -> Option<[f32; 2]> {
        let world = self.world?;
        Some([
            (position[0] - OFFSET) / MINIMAP_SCALE + world.x,
            (position[1] - OFFSET) / MINIMAP_SCALE + world.y,
        ])
    }

    fn lock_at(&mut self, position: Option<[f32; 2]>) {
        if let Some(world) = position.and_then(|p| self.screen_to_world(p)) {
            self.actions.push(UiAction::LockCamera(Some(world)));
        }
    }

    fn release(&mut self) {
        if self.dragging {
            self.dragging = false;
            self.actions.push(UiAction::LockCamera(None));
        }
    }
}

impl UiObject for Minimap {
    fn render(&mut self, canvas: &mut dyn Canvas, params: &RenderParams<'_>) {
        let Some(stage) = params.stage else {
            self.world = None;
            return;
        };
        let (min, max) = stage.bounds();
        let world = Rect::new(min[0], min[1], max[0] - min[0], max[1] - min[1]);
        self.world = Some(world);

        canvas.save();
        canvas.translate(OFFSET, OFFSET);
        canvas.scale(MINIMAP_SCALE, MINIMAP_SCALE);
        canvas.translate(-world.x, -world.y);

        canvas.fill_rect(world, params.theme.minimap_background);
        for entity in params.entities {
            draw_entity(canvas, entity, params.theme, 1.0 / MINIMAP_SCALE, false);
        }

        let options = MarbleDrawOptions {
            zoom: MINIMAP_SCALE,
            outline: false,
            minimap: true,
            viewport: None,
            use_skills: false,
        };
        for marble in params.marbles {
            marble.render(canvas, params.theme, None, &options);
        }

        let [width, height] = params.size;
        canvas.stroke_rect(
            params.camera.viewport(width, height),
            params.theme.minimap_viewport,
            1.0 / MINIMAP_SCALE,
        );
        canvas.restore();
    }

    fn bounding_box(&self) -> Option<Rect> {
        self.world.map(|world| {
            Rect::new(
                OFFSET,
                OFFSET,
                world.width * MINIMAP_SCALE,
                world.height * MINIMAP_SCALE,
            )
        })
    }

    fn on_pointer(&mut self, kind: PointerKind, position: Option<[f32; 2]>) {
        match kind {
            PointerKind::Down => {
                self.dragging = true;
                self.lock_at(position);
            }
            PointerKind::Move if self.dragging => self.lock_at(position),
            PointerKind::Up | PointerKind::Leave => self.release(),
            PointerKind::Move | PointerKind::DoubleClick => {}
        }
    }

    fn drain_actions(&mut self) -> Vec<UiAction> {
        std::mem::take(&mut self.actions)
    }
}
