use std::cell::{Cell, RefCell};
use std::rc::Rc;

use lightbox::{
    Bitmap, CancelHandle, ImageSource, LightboxConfig, LightboxError, LoadCallback, LoadPhase,
    PageController, PageListener, PageStatus, Point, Rect, RemoteLoader, Size, SourceKind,
    SurfaceHandle,
};
use url::Url;

/// Remote loader driven by the test. `complete` fires a request's callback
/// whether or not it was cancelled, like a loader that cannot suppress
/// completions.
#[derive(Default)]
struct ManualLoader {
    requests: RefCell<Vec<Request>>,
    cancels: Rc<Cell<usize>>,
}

struct Request {
    url: Url,
    target: SurfaceHandle,
    on_complete: Option<LoadCallback>,
    cancelled: Rc<Cell<bool>>,
}

impl ManualLoader {
    fn load_count(&self) -> usize {
        self.requests.borrow().len()
    }

    fn cancel_count(&self) -> usize {
        self.cancels.get()
    }

    fn is_cancelled(&self, index: usize) -> bool {
        self.requests.borrow()[index].cancelled.get()
    }

    /// Draw `bitmap` into the request's target and fire its callback.
    fn complete(&self, index: usize, bitmap: Option<Bitmap>) {
        let (target, callback) = {
            let mut requests = self.requests.borrow_mut();
            let request = &mut requests[index];
            (request.target.clone(), request.on_complete.take())
        };
        target.borrow_mut().set_image(bitmap.clone());
        if let Some(callback) = callback {
            callback(bitmap);
        }
    }
}

impl RemoteLoader for ManualLoader {
    fn load(&self, target: &SurfaceHandle, url: &Url, on_complete: LoadCallback) -> CancelHandle {
        let cancelled = Rc::new(Cell::new(false));
        self.requests.borrow_mut().push(Request {
            url: url.clone(),
            target: target.clone(),
            on_complete: Some(on_complete),
            cancelled: cancelled.clone(),
        });
        let cancels = self.cancels.clone();
        CancelHandle::new(move || {
            cancelled.set(true);
            cancels.set(cancels.get() + 1);
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Zoomed(f64),
    Loaded(Option<(u32, u32)>),
    VideoTapped(String),
    PageTapped(u64),
}

#[derive(Default)]
struct Recorder {
    events: RefCell<Vec<Event>>,
}

impl Recorder {
    fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    fn loads(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Loaded(_)))
            .count()
    }
}

impl PageListener for Recorder {
    fn on_zoom_changed(&self, page: &PageStatus) {
        self.events.borrow_mut().push(Event::Zoomed(page.zoom_scale));
    }

    fn on_remote_image_loaded(&self, bitmap: Option<&Bitmap>, _surface: &SurfaceHandle) {
        self.events
            .borrow_mut()
            .push(Event::Loaded(bitmap.map(|b| (b.width(), b.height()))));
    }

    fn on_video_button_tapped(&self, video: &Url) {
        self.events
            .borrow_mut()
            .push(Event::VideoTapped(video.to_string()));
    }

    fn on_page_tapped(&self, page: &PageStatus) {
        self.events.borrow_mut().push(Event::PageTapped(page.page_id));
    }
}

fn viewport() -> Size {
    Size::new(300.0, 400.0)
}

fn build(
    source: ImageSource,
    loader: &Rc<ManualLoader>,
    recorder: &Rc<Recorder>,
) -> PageController {
    PageController::builder(source, loader.clone())
        .listener(recorder)
        .viewport(viewport())
        .build()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 0.01
}

#[test]
fn every_variant_completes_exactly_once() {
    let loader = Rc::new(ManualLoader::default());
    let sources = vec![
        ImageSource::from_bitmap(Bitmap::solid(4, 4, [0; 4])),
        ImageSource::from_producer(|| Bitmap::solid(5, 5, [0; 4])),
        ImageSource::absent(),
    ];
    for source in sources {
        let recorder = Rc::new(Recorder::default());
        let page = build(source, &loader, &recorder);
        assert_eq!(recorder.loads(), 1);
        assert_eq!(page.phase(), LoadPhase::Loaded);
    }

    let recorder = Rc::new(Recorder::default());
    let page = build(
        ImageSource::from_url_str("https://x/img.png").unwrap(),
        &loader,
        &recorder,
    );
    assert_eq!(page.phase(), LoadPhase::Loading);
    assert_eq!(recorder.loads(), 0);
    assert_eq!(loader.load_count(), 1);

    loader.complete(0, Some(Bitmap::solid(6, 6, [0; 4])));
    assert_eq!(recorder.loads(), 1);
    assert_eq!(page.phase(), LoadPhase::Loaded);
    assert_eq!(loader.cancel_count(), 0);
}

#[test]
fn remote_image_is_fitted_and_centred() {
    let loader = Rc::new(ManualLoader::default());
    let recorder = Rc::new(Recorder::default());
    let page = build(
        ImageSource::from_url_str("https://x/img.png").unwrap(),
        &loader,
        &recorder,
    );
    assert_eq!(page.indicator_opacity(), 1.0);
    assert_eq!(loader.requests.borrow()[0].url.as_str(), "https://x/img.png");

    loader.complete(0, Some(Bitmap::solid(600, 300, [0; 4])));

    assert_eq!(page.display_frame().unwrap(), Rect::new(0.0, 125.0, 300.0, 150.0));
    assert_eq!(page.surface().borrow().frame(), Rect::new(0.0, 125.0, 300.0, 150.0));
    assert_eq!(page.indicator_opacity(), 0.0);
    assert_eq!(recorder.events(), vec![Event::Loaded(Some((600, 300)))]);
}

#[test]
fn remote_failure_reports_none() {
    let loader = Rc::new(ManualLoader::default());
    let recorder = Rc::new(Recorder::default());
    let page = build(
        ImageSource::from_url_str("https://x/missing.png").unwrap(),
        &loader,
        &recorder,
    );

    loader.complete(0, None);

    assert_eq!(page.phase(), LoadPhase::Failed);
    assert!(page.current_image().is_none());
    assert_eq!(page.indicator_opacity(), 0.0);
    assert_eq!(recorder.events(), vec![Event::Loaded(None)]);
}

#[test]
fn update_cancels_one_load_and_starts_one() {
    let loader = Rc::new(ManualLoader::default());
    let recorder = Rc::new(Recorder::default());
    let page = build(
        ImageSource::from_url_str("https://x/a.png").unwrap(),
        &loader,
        &recorder,
    );

    page.update(ImageSource::from_url_str("https://x/b.png").unwrap());
    assert_eq!(loader.load_count(), 2);
    assert_eq!(loader.cancel_count(), 1);
    assert!(loader.is_cancelled(0));
    assert!(!loader.is_cancelled(1));

    page.update(ImageSource::from_url_str("https://x/c.png").unwrap());
    assert_eq!(loader.load_count(), 3);
    assert_eq!(loader.cancel_count(), 2);
    assert!(page.is_loading());
}

#[test]
fn update_after_load_cancels_nothing() {
    let loader = Rc::new(ManualLoader::default());
    let recorder = Rc::new(Recorder::default());
    let page = build(
        ImageSource::from_url_str("https://x/a.png").unwrap(),
        &loader,
        &recorder,
    );
    loader.complete(0, Some(Bitmap::solid(10, 10, [0; 4])));

    page.update(ImageSource::from_url_str("https://x/b.png").unwrap());
    assert_eq!(loader.cancel_count(), 0);
    assert_eq!(loader.load_count(), 2);
}

#[test]
fn replaced_remote_load_is_discarded() {
    let loader = Rc::new(ManualLoader::default());
    let recorder = Rc::new(Recorder::default());
    let page = build(
        ImageSource::from_url_str("https://x/a.png").unwrap(),
        &loader,
        &recorder,
    );

    let b = Bitmap::solid(40, 20, [0, 0, 255, 255]);
    page.update(ImageSource::from_bitmap(b.clone()));
    assert_eq!(loader.cancel_count(), 1);
    assert_eq!(page.phase(), LoadPhase::Loaded);

    // The loader ignores the cancel, draws A and reports it anyway.
    loader.complete(0, Some(Bitmap::solid(600, 300, [255, 0, 0, 255])));

    assert!(page.current_image().unwrap().same_pixels(&b));
    assert_eq!(page.phase(), LoadPhase::Loaded);
    assert_eq!(recorder.events(), vec![Event::Loaded(Some((40, 20)))]);
}

#[test]
fn stale_completion_while_new_load_pending_is_ignored() {
    let loader = Rc::new(ManualLoader::default());
    let recorder = Rc::new(Recorder::default());
    let page = build(
        ImageSource::from_url_str("https://x/a.png").unwrap(),
        &loader,
        &recorder,
    );
    page.update(ImageSource::from_url_str("https://x/b.png").unwrap());
    assert_eq!(page.source_kind(), SourceKind::Remote);

    // The cancelled loader still draws into the surface; the page takes it back out.
    loader.complete(0, Some(Bitmap::solid(1, 1, [0; 4])));
    assert!(page.is_loading());
    assert!(page.current_image().is_none());
    assert_eq!(recorder.loads(), 0);

    loader.complete(1, Some(Bitmap::solid(2, 2, [0; 4])));
    assert_eq!(page.phase(), LoadPhase::Loaded);
    assert_eq!(page.current_image().unwrap().width(), 2);
    assert_eq!(recorder.events(), vec![Event::Loaded(Some((2, 2)))]);
}

#[test]
fn teardown_cancels_and_silences_completion() {
    let loader = Rc::new(ManualLoader::default());
    let recorder = Rc::new(Recorder::default());
    let page = build(
        ImageSource::from_url_str("https://x/a.png").unwrap(),
        &loader,
        &recorder,
    );

    page.teardown();
    assert_eq!(loader.cancel_count(), 1);

    loader.complete(0, Some(Bitmap::solid(3, 3, [0; 4])));
    assert!(recorder.events().is_empty());
}

#[test]
fn torn_down_page_ignores_zoom_and_layout() {
    let loader = Rc::new(ManualLoader::default());
    let recorder = Rc::new(Recorder::default());
    let page = build(
        ImageSource::from_bitmap(Bitmap::solid(600, 300, [0; 4])),
        &loader,
        &recorder,
    );
    page.teardown();

    assert!(matches!(
        page.double_tap(Point::new(150.0, 200.0)),
        Err(LightboxError::TornDown)
    ));
    assert_eq!(page.zoom_scale(), 1.0);

    page.configure_layout(Size::new(600.0, 600.0));
    assert_eq!(page.content_frame(), Some(Rect::new(0.0, 0.0, 300.0, 400.0)));
    assert_eq!(page.display_frame().unwrap(), Rect::new(0.0, 125.0, 300.0, 150.0));
    assert!(recorder
        .events()
        .iter()
        .all(|e| !matches!(e, Event::Zoomed(_))));
}

#[test]
fn dropped_page_cancels_and_ignores_late_callback() {
    let loader = Rc::new(ManualLoader::default());
    let recorder = Rc::new(Recorder::default());
    let page = build(
        ImageSource::from_url_str("https://x/a.png").unwrap(),
        &loader,
        &recorder,
    );

    drop(page);
    assert_eq!(loader.cancel_count(), 1);

    loader.complete(0, Some(Bitmap::solid(3, 3, [0; 4])));
    assert!(recorder.events().is_empty());
}

#[test]
fn double_tap_zooms_around_tap_point_and_back() {
    let loader = Rc::new(ManualLoader::default());
    let recorder = Rc::new(Recorder::default());
    let page = PageController::builder(
        ImageSource::from_bitmap(Bitmap::solid(300, 400, [0; 4])),
        loader.clone(),
    )
    .config(LightboxConfig::default().with_zoom_bounds(1.0, 3.0))
    .listener(&recorder)
    .viewport(viewport())
    .build();
    assert_eq!(page.zoom_scale(), 1.0);

    let target = page.double_tap(Point::new(150.0, 200.0)).unwrap();
    assert_eq!(target.scale, 3.0);
    // Centred on the tap so the tapped point stays under the finger.
    assert!(approx(target.rect.origin.x, 100.0));
    assert!(approx(target.rect.origin.y, 133.33));
    assert!(approx(target.rect.size.width, 100.0));
    assert!(approx(target.rect.size.height, 133.33));
    assert!(approx(target.rect.center().x, 150.0));
    assert!(approx(target.rect.center().y, 200.0));
    assert_eq!(page.zoom_scale(), 3.0);
    assert!(page.has_zoomed());
    assert_eq!(page.display_frame().unwrap(), Rect::new(0.0, 0.0, 900.0, 1200.0));

    let back = page.double_tap(Point::new(150.0, 200.0)).unwrap();
    assert_eq!(back.scale, 1.0);
    assert_eq!(page.zoom_scale(), 1.0);
    assert_eq!(page.display_frame().unwrap(), Rect::new(0.0, 0.0, 300.0, 400.0));

    assert_eq!(
        recorder.events()[1..],
        [Event::Zoomed(3.0), Event::Zoomed(1.0)]
    );
}

#[test]
fn taps_reach_the_listener() {
    let loader = Rc::new(ManualLoader::default());
    let recorder = Rc::new(Recorder::default());
    let video = Url::parse("https://x/clip.mp4").unwrap();
    let page = build(
        ImageSource::absent().with_video(video.clone()),
        &loader,
        &recorder,
    );

    page.single_tap();
    page.play_button_tapped();

    assert_eq!(
        recorder.events(),
        vec![
            Event::Loaded(None),
            Event::PageTapped(page.id()),
            Event::VideoTapped(video.to_string()),
        ]
    );
}

#[test]
fn listener_may_replace_source_from_callback() {
    struct Advance {
        page: RefCell<Option<Rc<PageController>>>,
        calls: Cell<usize>,
    }

    impl PageListener for Advance {
        fn on_remote_image_loaded(&self, _bitmap: Option<&Bitmap>, _surface: &SurfaceHandle) {
            self.calls.set(self.calls.get() + 1);
            if self.calls.get() == 1 {
                if let Some(page) = self.page.borrow().as_ref() {
                    page.update(ImageSource::from_bitmap(Bitmap::solid(7, 7, [0; 4])));
                }
            }
        }
    }

    let loader = Rc::new(ManualLoader::default());
    let listener = Rc::new(Advance {
        page: RefCell::new(None),
        calls: Cell::new(0),
    });
    let page = Rc::new(
        PageController::builder(
            ImageSource::from_url_str("https://x/a.png").unwrap(),
            loader.clone(),
        )
        .listener(&listener)
        .viewport(viewport())
        .build(),
    );
    *listener.page.borrow_mut() = Some(page.clone());

    loader.complete(0, Some(Bitmap::solid(2, 2, [0; 4])));

    assert_eq!(listener.calls.get(), 2);
    assert_eq!(page.current_image().unwrap().width(), 7);
    assert_eq!(page.phase(), LoadPhase::Loaded);

    listener.page.borrow_mut().take();
}
