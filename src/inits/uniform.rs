use crate::manager::ClusterManager;
use crate::memory::Primitive;
use crate::KMeans;
use rand::Rng;

/// Uniform random sampling (a.k.a. Forgy): draw k distinct point indices
/// without replacement and copy their vectors as the initial centroids.
pub(crate) fn calculate<T: Primitive, R: Rng>(
    data: &KMeans<T>,
    manager: &mut ClusterManager<T>,
    rnd: &mut R,
) {
    let chosen = rand::seq::index::sample(rnd, data.sample_cnt, manager.k());
    for (cluster_id, sample_id) in chosen.iter().enumerate() {
        manager.set_centroid(cluster_id, data.sample(sample_id));
    }
}
