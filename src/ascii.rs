//! ASCII rendering for the planet lattice and chunks
//!
//! Maps are downsampled to fit a maximum width so they stay readable in a terminal.

use crate::biomes::Biome;
use crate::chunk::{Chunk, TileType};
use crate::planet::PlanetLattice;

/// Get ASCII character for a biome
pub fn biome_char(biome: Biome) -> char {
    match biome {
        Biome::DeepOcean => '~',
        Biome::Ocean => '.',
        Biome::Beach => ',',
        Biome::Grassland => '"',
        Biome::Forest => 'T',
        Biome::Desert => 'd',
        Biome::Snow => '#',
        Biome::Mountain => '^',
    }
}

/// Get ASCII character for a tile
pub fn tile_char(tile: TileType) -> char {
    match tile {
        TileType::Water => '~',
        TileType::Grass => '"',
        TileType::Sand => ':',
        TileType::Rock => '^',
        TileType::Snow => '#',
        TileType::Forest => 'T',
        TileType::Desert => 'd',
    }
}

/// Sampling step so that `len` cells fit in `max` characters
fn step_for(len: usize, max: usize) -> usize {
    len.div_ceil(max.max(1)).max(1)
}

/// Render the lattice north-up (last row first), downsampled to at most
/// `max_width` columns.
pub fn render_lattice(lattice: &PlanetLattice, max_width: usize) -> String {
    let res = lattice.resolution();
    let step = step_for(res, max_width);
    let mut result = String::with_capacity((res / step + 2) * (res / step + 1));

    for row in (0..res).rev().step_by(step) {
        for col in (0..res).step_by(step) {
            result.push(biome_char(lattice.biome_at(row, col)));
        }
        result.push('\n');
    }

    result
}

/// Render a chunk with `y = 0` on top, downsampled to at most `max_width` columns.
pub fn render_chunk(chunk: &Chunk, max_width: usize) -> String {
    let size = chunk.size();
    let step = step_for(size, max_width);
    let mut result = String::with_capacity((size / step + 2) * (size / step + 1));

    for y in (0..size).step_by(step) {
        for x in (0..size).step_by(step) {
            result.push(tile_char(chunk.get(x, y)));
        }
        result.push('\n');
    }

    result
}

/// Generate legend for biome characters
pub fn biome_legend() -> String {
    let mut legend = String::from("=== BIOME LEGEND ===\n");
    for &biome in Biome::all() {
        legend.push_str(&format!("  {} {}\n", biome_char(biome), biome.name()));
    }
    legend
}

/// Generate legend for tile characters
pub fn tile_legend() -> String {
    let mut legend = String::from("=== TILE LEGEND ===\n");
    for &tile in TileType::all() {
        legend.push_str(&format!("  {} {}\n", tile_char(tile), tile.name()));
    }
    legend
}

/// Table of cell counts and shares per biome, most common first
pub fn biome_table(lattice: &PlanetLattice) -> String {
    let counts = lattice.biome_counts();
    let total: usize = counts.iter().sum();

    let mut rows: Vec<(Biome, usize)> = Biome::all()
        .iter()
        .map(|&b| (b, counts[b.id() as usize]))
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut table = String::new();
    for (biome, count) in rows {
        let share = if total == 0 { 0.0 } else { count as f64 * 100.0 / total as f64 };
        table.push_str(&format!(
            "  {} {:<12} {:>7} {:>6.2}%\n",
            biome_char(biome),
            biome.name(),
            count,
            share
        ));
    }
    table
}

/// One-line summary of a chunk's tile composition
pub fn chunk_summary(chunk: &Chunk) -> String {
    let counts = chunk.composition();
    let total = chunk.tiles().len().max(1) as f64;
    let parts: Vec<String> = TileType::all()
        .iter()
        .filter(|t| counts[t.code() as usize] > 0)
        .map(|t| format!("{} {:.1}%", t.name(), counts[t.code() as usize] as f64 * 100.0 / total))
        .collect();

    format!(
        "chunk {} -> cell ({}, {}) {} | {}",
        chunk.coord(),
        chunk.cell().row,
        chunk.cell().col,
        chunk.center_biome(),
        parts.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{ChunkCoord, LatticeCell, NeighborBiomes};

    fn lattice() -> PlanetLattice {
        let mut biomes = vec![Biome::Ocean; 16];
        // Row 3 is the north pole and renders first
        biomes[12] = Biome::Snow;
        biomes[1] = Biome::Desert;
        PlanetLattice::from_biomes(4, 1, biomes).unwrap()
    }

    #[test]
    fn test_render_lattice_north_up() {
        let text = render_lattice(&lattice(), 80);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "#...");
        assert_eq!(lines[3], ".d..");
    }

    #[test]
    fn test_render_lattice_downsamples() {
        let text = render_lattice(&lattice(), 2);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.chars().count() == 2));
    }

    #[test]
    fn test_render_chunk() {
        let chunk = Chunk::from_tiles(
            ChunkCoord::new(1, 2),
            LatticeCell { row: 3, col: 4 },
            Biome::Beach,
            NeighborBiomes([Biome::Ocean; 8]),
            0,
            2,
            vec![TileType::Water, TileType::Sand, TileType::Grass, TileType::Sand],
        )
        .unwrap();

        assert_eq!(render_chunk(&chunk, 10), "~:\n\":\n");
        let summary = chunk_summary(&chunk);
        assert!(summary.contains("Sand 50.0%"));
        assert!(summary.contains("Beach"));
    }

    #[test]
    fn test_legends_cover_everything() {
        assert_eq!(biome_legend().lines().count(), Biome::all().len() + 1);
        assert_eq!(tile_legend().lines().count(), TileType::all().len() + 1);
        assert_eq!(biome_table(&lattice()).lines().count(), 8);
    }
}
