use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage};
use tracing::info;

use crate::chunk::Chunk;
use crate::error::ExportError;
use crate::planet::PlanetLattice;

/// Largest exported image side, in pixels
pub const MAX_IMAGE_SIDE: u32 = 1 << 16;

/// Pixel side length of a square image of `side` cells, each `scale` pixels wide.
fn image_side(side: usize, scale: u32) -> Result<u32, ExportError> {
    u32::try_from(side)
        .ok()
        .and_then(|s| s.checked_mul(scale))
        .filter(|&pixels| pixels <= MAX_IMAGE_SIDE)
        .ok_or(ExportError::TooLarge { side, scale })
}

/// Render the biome map, north-up, one pixel per cell scaled by `scale`.
pub fn render_planet(lattice: &PlanetLattice, scale: u32) -> Result<RgbImage, ExportError> {
    let res = lattice.resolution() as u32;
    let scale = scale.max(1);
    let side = image_side(lattice.resolution(), scale)?;
    let mut img: RgbImage = ImageBuffer::new(side, side);

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let col = (x / scale) as usize;
        // Image y grows downward, lattice rows grow northward
        let row = (res - 1 - y / scale) as usize;
        *pixel = Rgb(lattice.biome_at(row, col).color());
    }
    Ok(img)
}

/// Render a chunk's tiles, `scale` pixels per tile.
pub fn render_chunk(chunk: &Chunk, scale: u32) -> Result<RgbImage, ExportError> {
    let scale = scale.max(1);
    let side = image_side(chunk.size(), scale)?;
    let mut img: RgbImage = ImageBuffer::new(side, side);

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let tile = chunk.get((x / scale) as usize, (y / scale) as usize);
        *pixel = Rgb(tile.color());
    }
    Ok(img)
}

/// Export the biome map as PNG.
pub fn export_planet_png(
    lattice: &PlanetLattice,
    scale: u32,
    path: impl AsRef<Path>,
) -> Result<(), ExportError> {
    if lattice.resolution() == 0 {
        return Err(ExportError::Empty("planet lattice"));
    }
    let path = path.as_ref();
    render_planet(lattice, scale)?.save(path)?;
    info!(path = %path.display(), "exported planet map");
    Ok(())
}

/// Export a chunk's tile grid as PNG.
pub fn export_chunk_png(chunk: &Chunk, scale: u32, path: impl AsRef<Path>) -> Result<(), ExportError> {
    if chunk.size() == 0 {
        return Err(ExportError::Empty("chunk"));
    }
    let path = path.as_ref();
    render_chunk(chunk, scale)?.save(path)?;
    info!(path = %path.display(), x = chunk.coord().x, y = chunk.coord().y, "exported chunk");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biomes::Biome;
    use crate::chunk::{ChunkCoord, LatticeCell, NeighborBiomes, TileType};

    #[test]
    fn test_render_planet_is_north_up() {
        let mut biomes = vec![Biome::Ocean; 9];
        biomes[6] = Biome::Snow; // row 2, col 0
        let lattice = PlanetLattice::from_biomes(3, 0, biomes).unwrap();

        let img = render_planet(&lattice, 2).unwrap();
        assert_eq!(img.dimensions(), (6, 6));
        assert_eq!(img.get_pixel(0, 0).0, Biome::Snow.color());
        assert_eq!(img.get_pixel(1, 1).0, Biome::Snow.color());
        assert_eq!(img.get_pixel(5, 5).0, Biome::Ocean.color());
    }

    #[test]
    fn test_render_chunk_pixels() {
        let chunk = Chunk::from_tiles(
            ChunkCoord::new(0, 0),
            LatticeCell::default(),
            Biome::Desert,
            NeighborBiomes([Biome::Desert; 8]),
            0,
            2,
            vec![TileType::Desert, TileType::Rock, TileType::Water, TileType::Sand],
        )
        .unwrap();

        let img = render_chunk(&chunk, 1).unwrap();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(1, 0).0, TileType::Rock.color());
        assert_eq!(img.get_pixel(0, 1).0, TileType::Water.color());
    }

    #[test]
    fn test_oversized_scale_is_rejected() {
        let lattice = PlanetLattice::from_biomes(3, 0, vec![Biome::Ocean; 9]).unwrap();
        assert!(matches!(
            render_planet(&lattice, u32::MAX),
            Err(ExportError::TooLarge { side: 3, scale: u32::MAX })
        ));

        let path = std::env::temp_dir().join(format!("planet_chunks_oversized_{}.png", std::process::id()));
        assert!(export_planet_png(&lattice, u32::MAX / 2, &path).is_err());
        assert!(!path.exists());

        // Fits in u32 but not under the side cap
        assert!(render_planet(&lattice, MAX_IMAGE_SIDE).is_err());
        assert_eq!(image_side(3, 4).unwrap(), 12);
    }

    #[test]
    fn test_export_writes_png() {
        let lattice = PlanetLattice::from_biomes(2, 0, vec![Biome::Forest; 4]).unwrap();
        let path = std::env::temp_dir().join(format!("planet_chunks_export_{}.png", std::process::id()));

        export_planet_png(&lattice, 1, &path).unwrap();
        assert!(path.exists());
        let _ = std::fs::remove_file(&path);
    }
}
