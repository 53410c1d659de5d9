//! Ranking panel along the right edge.

use super::{PointerKind, UiAction, UiObject};
use crate::marble::Marble;
use crate::render::{Canvas, Rect, RenderParams, TextAlign, TextStyle};

const LINE_HEIGHT: f32 = 16.0;
const FONT_SIZE: f32 = 13.0;
const PANEL_WIDTH: f32 = 180.0;
const MARGIN: f32 = 5.0;
/// Wheel deltas are divided by this before scrolling.
const WHEEL_STEP: f32 = 2.0;

/// Winners first, then the marbles still racing.
#[derive(Debug, Default)]
pub struct RankRenderer {
    scroll: f32,
    target_scroll: f32,
    /// Set by the wheel; disables auto-scroll until the next race.
    manual_scroll: bool,
    last_winner_count: usize,
    bounds: Option<Rect>,
    ranking: Vec<String>,
    actions: Vec<UiAction>,
}

impl RankRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lines(winners: &[Marble], marbles: &[Marble]) -> Vec<(String, bool)> {
        let finished = winners
            .iter()
            .enumerate()
            .map(|(rank, m)| (format!("\u{2606} {} #{}", m.name, rank + 1), true));
        let racing = marbles
            .iter()
            .enumerate()
            .map(|(i, m)| (format!("{} #{}", m.name, winners.len() + i + 1), false));
        finished.chain(racing).collect()
    }

    fn max_scroll(&self, height: f32) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let content = self.ranking.len() as f32 * LINE_HEIGHT;
        (content - height / 2.0).max(0.0)
    }

    /// Plain-text ranking as last rendered.
    pub fn ranking_text(&self) -> String {
        self.ranking.join("\n")
    }
}

impl UiObject for RankRenderer {
    fn update(&mut self, dt: f32) {
        let d = self.target_scroll - self.scroll;
        self.scroll = if d.abs() < 0.5 {
            self.target_scroll
        } else {
            self.scroll + d * (dt / 100.0).min(1.0)
        };
    }

    fn render(&mut self, canvas: &mut dyn Canvas, params: &RenderParams<'_>) {
        let [width, height] = params.size;
        let lines = Self::lines(params.winners, params.marbles);
        self.ranking = lines.iter().map(|(text, _)| text.clone()).collect();

        if params.winners.is_empty() {
            self.manual_scroll = false;
        }
        if !self.manual_scroll && params.winners.len() != self.last_winner_count {
            #[allow(clippy::cast_precision_loss)]
            let winners = params.winners.len() as f32;
            self.target_scroll = (winners * LINE_HEIGHT).min(self.max_scroll(height));
        }
        self.last_winner_count = params.winners.len();

        let bounds = Rect::new(width - PANEL_WIDTH, 0.0, PANEL_WIDTH, height);
        self.bounds = Some(bounds);
        if lines.is_empty() {
            return;
        }

        #[allow(clippy::cast_precision_loss)]
        let panel_height = (lines.len() as f32 * LINE_HEIGHT + MARGIN * 2.0).min(height);
        canvas.fill_rect(Rect::new(bounds.x, 0.0, PANEL_WIDTH, panel_height), params.theme.rank_background);

        let x = width - MARGIN;
        let first_y = MARGIN + LINE_HEIGHT - self.scroll;
        let tracked = params.winner_rank;
        for (index, (text, finished)) in lines.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let y = first_y + index as f32 * LINE_HEIGHT;
            if y < 0.0 || y > height + LINE_HEIGHT {
                continue;
            }

            let marble = if *finished {
                &params.winners[index]
            } else {
                &params.marbles[index - params.winners.len()]
            };
            let mut style = TextStyle::new(FONT_SIZE, marble.color(params.theme)).align(TextAlign::Right);
            if index == tracked {
                style = style.bold();
            }
            if let Some(stroke) = params.theme.rank_stroke {
                style = style.stroke(stroke, 2.0);
            }
            canvas.text(text, [x, y], &style);
        }
    }

    fn bounding_box(&self) -> Option<Rect> {
        self.bounds
    }

    fn on_pointer(&mut self, kind: PointerKind, _position: Option<[f32; 2]>) {
        if kind == PointerKind::DoubleClick && !self.ranking.is_empty() {
            tracing::info!("[rank] ranking copied ({} entries)", self.ranking.len());
            self.actions.push(UiAction::Message(self.ranking_text()));
        }
    }

    fn on_wheel(&mut self, delta: f32) {
        let height = self.bounds.map_or(0.0, |b| b.height);
        self.manual_scroll = true;
        self.target_scroll = (self.target_scroll + delta / WHEEL_STEP).clamp(0.0, self.max_scroll(height));
    }

    fn drain_actions(&mut self) -> Vec<UiAction> {
        std::mem::take(&mut self.actions)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::camera::Camera;
    use crate::config::EngineConfig;
    use crate::effects::ParticleManager;
    use crate::render::DrawList;
    use crate::theme::ColorTheme;

    #[test]
    fn test_ranking_lists_winners_first() {
        let camera = Camera::new(&EngineConfig::default());
        let particles = ParticleManager::new();
        let theme = ColorTheme::dark();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let winners = vec![Marble::new(2, "Carol", 1.0, 3, &mut rng)];
        let marbles = vec![
            Marble::new(0, "Alice", 1.0, 3, &mut rng),
            Marble::new(1, "Bob", 1.0, 3, &mut rng),
        ];
        let params = RenderParams {
            camera: &camera,
            stage: None,
            entities: &[],
            marbles: &marbles,
            winners: &winners,
            winner: None,
            winner_rank: 0,
            total_marble_count: 3,
            effects: &[],
            particles: &particles,
            theme: &theme,
            size: [1600.0, 900.0],
            use_skills: false,
        };

        let mut rank = RankRenderer::new();
        assert!(rank.drain_actions().is_empty());

        let mut canvas = DrawList::new();
        rank.render(&mut canvas, &params);
        assert_eq!(canvas.texts(), vec!["\u{2606} Carol #1", "Alice #2", "Bob #3"]);
        assert_eq!(rank.bounding_box(), Some(Rect::new(1420.0, 0.0, 180.0, 900.0)));

        rank.on_pointer(PointerKind::Down, Some([1500.0, 10.0]));
        assert!(rank.drain_actions().is_empty());
        rank.on_pointer(PointerKind::DoubleClick, Some([1500.0, 10.0]));
        assert_eq!(
            rank.drain_actions(),
            vec![UiAction::Message("\u{2606} Carol #1\nAlice #2\nBob #3".to_string())]
        );
    }

    #[test]
    fn test_wheel_clamps_scroll() {
        let mut rank = RankRenderer::new();
        rank.on_wheel(100.0);
        assert_eq!(rank.target_scroll, 0.0);
        assert!(rank.manual_scroll);
    }
}
