use dlc_ticket_protocol::{encode_body, BuildContext, Folder, ImageProfile, TicketBody};
use tracing::{debug, info};

use super::JobRequester;
use crate::error::RequesterError;
use crate::handle::TicketHandle;
use crate::store::CannedAcl;

impl JobRequester {
    /// Submit a test request for `image`.
    ///
    /// The image is classified and the instance count checked before
    /// anything is written. The ticket is first created empty, then
    /// overwritten with its body, then granted `bucket-owner-full-control`
    /// so the executor account can read and move it.
    pub fn submit(
        &self,
        image: &str,
        context: BuildContext,
        instances_num: u32,
    ) -> Result<TicketHandle, RequesterError> {
        let profile = ImageProfile::classify(image)?;
        if instances_num == 0 {
            return Err(RequesterError::InvalidInstanceCount(instances_num));
        }

        let timestamp = self.clock.now();
        let body = TicketBody::new(
            context,
            timestamp.clone(),
            image,
            instances_num,
            self.timeout_limit,
            self.env.commit(),
        );
        let encoded = encode_body(&body)?;

        let name = self.minter.mint(profile.framework, &timestamp);
        let key = Folder::RequestTickets.key(name.as_str());

        self.store.put(&self.bucket, &key, &[])?;
        debug!(key = %key, "created empty ticket");
        self.store.put(&self.bucket, &key, &encoded)?;
        self.store
            .set_acl(&self.bucket, &key, CannedAcl::BucketOwnerFullControl)?;

        info!(
            ticket = %name,
            image = %image,
            context = %context,
            instances = instances_num,
            instance_type = profile.instance_type,
            "submitted test request"
        );

        Ok(TicketHandle {
            bucket: self.bucket.clone(),
            ticket_name: name.as_str().to_string(),
            image: image.to_string(),
            instance_type: profile.instance_type.to_string(),
            job_type: profile.job_type,
            timestamp,
        })
    }
}
