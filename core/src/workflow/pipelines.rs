// ranmix/src/workflow/pipelines.rs

//! The order submission pipeline: validate, create the record, deliver the notice.

use crate::channel::{NotificationChannelClient, NotifyReceipt};
use crate::clock::Clock;
use crate::error::RanmixError;
use crate::order::{order_id, Order, OrderStatus};
use crate::pipeline::{ContextData, Pipeline, PipelineControl, SkipCondition};
use crate::workflow::state::PaymentForm;
use std::sync::Arc;
use tracing::{event, Level};

/// Called once the order record has been written, before the notice goes out.
pub type RecordedHook = Arc<dyn Fn(&Order) + Send + Sync>;

pub struct SubmissionCtxData {
  pub form: PaymentForm,
  /// Set once the durable record exists; later runs skip straight to delivery.
  pub order: Option<Order>,
  pub receipt: Option<NotifyReceipt>,
  pub channel: NotificationChannelClient,
  pub clock: Arc<dyn Clock>,
  pub on_recorded: Option<RecordedHook>,
}

pub type SubmissionCtx = ContextData<SubmissionCtxData>;

fn order_recorded(ctx: SubmissionCtx) -> bool {
  ctx.read().order.is_some()
}

/// Builds the three-step submission pipeline. A failed delivery stops it with
/// `PipelineResult::Stopped`; re-running the same context only retries delivery.
pub fn submission_pipeline() -> Pipeline<SubmissionCtxData, RanmixError> {
  let already_recorded: SkipCondition<SubmissionCtxData> = Arc::new(order_recorded);
  let mut p = Pipeline::<SubmissionCtxData, RanmixError>::new(&[
    ("validate_submission", false, Some(already_recorded.clone())),
    ("create_order_record", false, Some(already_recorded)),
    ("deliver_notification", false, None),
  ]);

  p.on_root("validate_submission", |ctx: SubmissionCtx| async move {
    ctx.read().form.validate()?;
    Ok::<_, RanmixError>(PipelineControl::Continue)
  });

  p.on_root("create_order_record", |ctx: SubmissionCtx| async move {
    let (order, orders) = {
      let guard = ctx.read();
      let now = guard.clock.now();
      let form = &guard.form;
      let customer = form.customer_name.trim().to_string();
      let order = Order {
        id: order_id(now.timestamp_millis(), &customer),
        customer_name: customer,
        email: form.email.trim().to_string(),
        phone: form.phone.trim().to_string(),
        amount: form.amount,
        payment_method: form.payment_method.clone(),
        status: OrderStatus::Pending,
        created_at: now,
        updated_at: now,
      };
      (order, guard.channel.orders().clone())
    };

    orders.insert(order.clone()).await?;
    event!(Level::INFO, order_id = %order.id, "Order record created.");
    let hook = ctx.read().on_recorded.clone();
    if let Some(hook) = hook {
      hook(&order);
    }
    ctx.write().order = Some(order);
    Ok::<_, RanmixError>(PipelineControl::Continue)
  });

  p.on_root("deliver_notification", |ctx: SubmissionCtx| async move {
    let (channel, order, evidence) = {
      let guard = ctx.read();
      let order = guard
        .order
        .clone()
        .ok_or_else(|| RanmixError::NotFound("order record for delivery".into()))?;
      (guard.channel.clone(), order, guard.form.evidence.clone())
    };

    let receipt = channel.notify(&order, evidence.as_ref()).await;
    let delivered = receipt.delivered;
    ctx.write().receipt = Some(receipt);

    if delivered {
      Ok::<_, RanmixError>(PipelineControl::Continue)
    } else {
      Ok(PipelineControl::Stop)
    }
  });

  p
}
