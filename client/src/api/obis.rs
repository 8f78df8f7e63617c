use futures_util::FutureExt;
use log::{debug, info, warn};

use matsya_common::model::obis::SyncResult;

use super::MatsyaClient;
use crate::backend::ManagedBackend;
use crate::error::{ClientError, ClientResult};
use crate::fallback::Route;
use crate::obis::{ObisClient, OCCURRENCES_PER_SPECIES, TARGET_SPECIES};

/// Pull occurrences for every target species and insert the unseen ones.
///
/// Duplicates are detected by exact scientific name only, so running this
/// twice against unchanged OBIS data inserts nothing the second time.
///
/// A failure before the first insert may fall back to the API. Once a row
/// has been written the failure is reported as [`ClientError::PartialSync`]
/// with the number of rows already inserted.
async fn sync_via_backend(
    backend: &dyn ManagedBackend,
    obis: &ObisClient,
) -> ClientResult<SyncResult> {
    let mut count = 0u32;
    if let Err(e) = insert_unseen(backend, obis, &mut count).await {
        if count == 0 {
            return Err(e);
        }
        warn!("OBIS sync failed after inserting {count} species: {e}");
        return Err(ClientError::PartialSync {
            inserted: count,
            source: Box::new(e),
        });
    }
    info!("OBIS sync inserted {count} new species");
    Ok(SyncResult {
        message: format!("Synced {count} new species from OBIS"),
        count,
    })
}

async fn insert_unseen(
    backend: &dyn ManagedBackend,
    obis: &ObisClient,
    count: &mut u32,
) -> ClientResult<()> {
    for name in TARGET_SPECIES {
        let occurrences = obis.occurrences(name, OCCURRENCES_PER_SPECIES).await?;
        debug!("OBIS returned {} occurrences for {name}", occurrences.len());
        for occurrence in occurrences {
            if backend.species_exists(&occurrence.scientific_name).await? {
                continue;
            }
            backend.insert_species(&occurrence.to_new_species()).await?;
            *count += 1;
        }
    }
    Ok(())
}

impl MatsyaClient {
    /// Import target species from OBIS.
    ///
    /// Without the managed route the whole sync is delegated to the API's
    /// `POST /obis/sync`.
    pub async fn sync_obis(&self) -> ClientResult<SyncResult> {
        self.plan()
            .execute("sync_obis", move |route| {
                async move {
                    match route {
                        Route::Managed(backend) => sync_via_backend(backend, &self.obis).await,
                        Route::Http => self.http.post_empty("/obis/sync").await,
                    }
                }
                .boxed()
            })
            .await
    }
}
