use formnote_core::{
    ActionMessages, ActionOutcome, ExternalAction, Lifecycle, Notice, NoticeCenter,
    NoticeDuration, NoticeKind,
};
use std::error::Error;
use std::sync::{Arc, Mutex};

enum Mail {
    Ready,
    NoApp,
    Broken,
    Panicking,
}

impl ExternalAction for Mail {
    fn can_handle(&self) -> bool {
        !matches!(self, Mail::NoApp)
    }

    fn launch(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        match self {
            Mail::Ready | Mail::NoApp => Ok(()),
            Mail::Broken => Err("activity not found".into()),
            Mail::Panicking => panic!("intent resolver crashed"),
        }
    }
}

fn messages() -> ActionMessages {
    ActionMessages {
        no_handler: "未找到邮件应用".to_string(),
        failed: "无法打开邮件应用".to_string(),
    }
}

fn watch(center: &NoticeCenter) -> Arc<Mutex<Vec<Notice>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    center
        .notices()
        .attach_observer(&Lifecycle::started(), move |notice: Option<&Notice>| {
            sink.lock().unwrap().extend(notice.cloned());
        })
        .unwrap();
    seen
}

#[test]
fn launched_action_posts_nothing() {
    let center = NoticeCenter::new();
    let seen = watch(&center);

    let outcome = center.trigger_external_action(&Mail::Ready, &messages());

    assert_eq!(outcome, ActionOutcome::Launched);
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn missing_handler_posts_long_notice() {
    let center = NoticeCenter::new();
    let seen = watch(&center);

    let outcome = center.trigger_external_action(&Mail::NoApp, &messages());

    assert_eq!(outcome, ActionOutcome::NoHandler);
    let notices = seen.lock().unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, "未找到邮件应用");
    assert_eq!(notices[0].duration, NoticeDuration::Long);
}

#[test]
fn failures_and_panics_post_short_error_notice() {
    let center = NoticeCenter::new();
    let seen = watch(&center);

    assert_eq!(
        center.trigger_external_action(&Mail::Broken, &messages()),
        ActionOutcome::Failed
    );
    assert_eq!(
        center.trigger_external_action(&Mail::Panicking, &messages()),
        ActionOutcome::Failed
    );

    let notices = seen.lock().unwrap();
    assert_eq!(notices.len(), 2);
    assert!(notices.iter().all(|notice| notice.kind == NoticeKind::Error
        && notice.duration == NoticeDuration::Short
        && notice.message == "无法打开邮件应用"));
}

#[test]
fn notice_published_before_attach_is_shown_once() {
    let center = NoticeCenter::new();
    center.show_info("已保存", NoticeDuration::Short);

    let seen = watch(&center);
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert_eq!(seen.lock().unwrap()[0].kind, NoticeKind::Info);

    center.notices().detach_observer();
    let replay = watch(&center);
    assert!(replay.lock().unwrap().is_empty());
}
