//! Fruchterman–Reingold force layout.
//!
//! Nodes start evenly spaced on a circle, so a given graph always lays out
//! the same way. Every pair repels with `k²/d`, every edge attracts with
//! `d²/k`, and the per-step move is capped by a linearly cooling temperature.

use serde::{Deserialize, Serialize};

use crate::graph::Graph;

/// Below this distance two nodes count as coincident.
const MIN_DISTANCE: f64 = 1e-6;
/// Separation applied to coincident nodes.
const NUDGE: f64 = 0.5;
/// Golden angle in radians; spreads nudge directions by index.
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub width: f64,
    pub height: f64,
    pub iterations: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 800.0,
            iterations: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Vec2 {
    x: f64,
    y: f64,
}

impl Vec2 {
    fn len(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

fn nudge_direction(i: usize) -> Vec2 {
    let theta = GOLDEN_ANGLE * (i as f64 + 1.0);
    Vec2 { x: theta.cos(), y: theta.sin() }
}

/// Positions for `n` nodes joined by `edges` (node index pairs).
pub fn force_layout(n: usize, edges: &[(usize, usize)], config: &LayoutConfig) -> Vec<(f64, f64)> {
    let (w, h) = (config.width.max(1.0), config.height.max(1.0));
    let center = Vec2 { x: w / 2.0, y: h / 2.0 };
    match n {
        0 => return Vec::new(),
        1 => return vec![(center.x, center.y)],
        _ => {}
    }

    let radius = 0.4 * w.min(h);
    let mut pos: Vec<Vec2> = (0..n)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / n as f64;
            Vec2 { x: center.x + radius * angle.cos(), y: center.y + radius * angle.sin() }
        })
        .collect();

    let k = (w * h / n as f64).sqrt();
    let t0 = w.min(h) / 10.0;
    let mut disp = vec![Vec2 { x: 0.0, y: 0.0 }; n];

    for iter in 0..config.iterations {
        let temperature = t0 * (1.0 - iter as f64 / config.iterations as f64);
        disp.iter_mut().for_each(|d| *d = Vec2 { x: 0.0, y: 0.0 });

        for i in 0..n {
            for j in (i + 1)..n {
                let (dx, dy, d) = separation(pos[i], pos[j], i);
                let force = k * k / d;
                disp[i].x += dx / d * force;
                disp[i].y += dy / d * force;
                disp[j].x -= dx / d * force;
                disp[j].y -= dy / d * force;
            }
        }

        for &(u, v) in edges {
            if u == v || u >= n || v >= n {
                continue;
            }
            let (dx, dy, d) = separation(pos[u], pos[v], u);
            let force = d * d / k;
            disp[u].x -= dx / d * force;
            disp[u].y -= dy / d * force;
            disp[v].x += dx / d * force;
            disp[v].y += dy / d * force;
        }

        for (p, d) in pos.iter_mut().zip(&disp) {
            let len = d.len();
            if len > 0.0 && len.is_finite() {
                let step = len.min(temperature);
                p.x += d.x / len * step;
                p.y += d.y / len * step;
            }
            p.x = p.x.clamp(0.0, w);
            p.y = p.y.clamp(0.0, h);
        }
    }

    separate_coincident(&mut pos, w, h);
    pos.into_iter().map(|p| (p.x, p.y)).collect()
}

/// `(dx, dy, d)` from `b` to `a`, with an index-based direction when they coincide.
fn separation(a: Vec2, b: Vec2, i: usize) -> (f64, f64, f64) {
    let (dx, dy) = (a.x - b.x, a.y - b.y);
    let d = (dx * dx + dy * dy).sqrt();
    if d < MIN_DISTANCE {
        let dir = nudge_direction(i);
        return (dir.x * MIN_DISTANCE, dir.y * MIN_DISTANCE, MIN_DISTANCE);
    }
    (dx, dy, d)
}

/// Clamping can pile nodes into the same corner; push duplicates apart inside the box.
fn separate_coincident(pos: &mut [Vec2], w: f64, h: f64) {
    let n = pos.len();
    for _ in 0..n {
        let mut moved = false;
        for j in 1..n {
            if (0..j).any(|i| Vec2 { x: pos[i].x - pos[j].x, y: pos[i].y - pos[j].y }.len() < MIN_DISTANCE) {
                let dir = nudge_direction(j);
                let step = NUDGE * (1.0 + j as f64 / n as f64);
                // Reflect off the walls so the nudge always lands inside.
                let mut x = pos[j].x + dir.x * step;
                let mut y = pos[j].y + dir.y * step;
                if !(0.0..=w).contains(&x) {
                    x = pos[j].x - dir.x * step;
                }
                if !(0.0..=h).contains(&y) {
                    y = pos[j].y - dir.y * step;
                }
                pos[j] = Vec2 { x: x.clamp(0.0, w), y: y.clamp(0.0, h) };
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }
}

/// Lay out `graph` in place, filling every node's `x`/`y`.
pub fn apply_layout(graph: &mut Graph, config: &LayoutConfig) {
    let edges = graph.edge_indices();
    let positions = force_layout(graph.nodes.len(), &edges, config);
    for (node, (x, y)) in graph.nodes.iter_mut().zip(positions) {
        node.x = Some(x);
        node.y = Some(y);
    }
}
