//! Flat L2-distance vector index.

use crate::{Error, Result};

/// Exhaustive nearest-neighbor index over fixed-dimension vectors.
///
/// Row `i` of the index corresponds to chunk `i` of the document it was
/// built from; callers rely on that correspondence.
#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dimensions: usize,
    vectors: Vec<Vec<f32>>,
}

/// One search hit, ordered by increasing distance.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f32,
}

impl FlatL2Index {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            vectors: Vec::new(),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Append vectors as new rows, in order.
    pub fn add(&mut self, vectors: Vec<Vec<f32>>) -> Result<()> {
        for vector in &vectors {
            if vector.len() != self.dimensions {
                return Err(Error::embedding(format!(
                    "vector dimension mismatch: {} != {}",
                    vector.len(),
                    self.dimensions
                )));
            }
        }
        self.vectors.extend(vectors);
        Ok(())
    }

    /// The `k` rows nearest to `query` by L2 distance, closest first. At
    /// most `len()` results are returned.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimensions {
            return Err(Error::embedding(format!(
                "query dimension mismatch: {} != {}",
                query.len(),
                self.dimensions
            )));
        }
        let mut neighbors: Vec<Neighbor> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(index, vector)| Neighbor {
                index,
                distance: euclidean_distance(query, vector),
            })
            .collect();
        neighbors.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        neighbors.truncate(k);
        Ok(neighbors)
    }
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt()
}
