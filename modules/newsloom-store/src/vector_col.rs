//! Conversion between the domain's plain `Vec<f32>` embeddings and the
//! `pgvector` wire type used for the `vector(384)` column.

pub(crate) fn to_pgvector(v: &Option<Vec<f32>>) -> Option<pgvector::Vector> {
    v.as_ref().map(|v| pgvector::Vector::from(v.clone()))
}

pub(crate) fn from_pgvector(v: Option<pgvector::Vector>) -> Option<Vec<f32>> {
    v.map(|v| v.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_some() {
        let original = Some(vec![1.0_f32, 2.0, 3.0]);
        let pg = to_pgvector(&original);
        assert_eq!(from_pgvector(pg), original);
    }

    #[test]
    fn round_trips_none() {
        let original: Option<Vec<f32>> = None;
        assert_eq!(from_pgvector(to_pgvector(&original)), None);
    }
}
