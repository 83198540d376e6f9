//! HTML fixtures shaped like Tabelog pages

pub(crate) const DETAIL_URL: &str = "https://tabelog.com/en/tokyo/A1301/A130101/13000001/";

pub(crate) const DETAIL_HTML: &str = r#"
<html><body>
  <a class="rdheader-rating__review-target" href="dtlrvwlst/"><em class="num">1,234</em> reviews</a>
  <h3 class="pr-comment-title js-pr-title">
    Charcoal-grilled skewers
  </h3>
  <span class="pr-comment__first"> Counter seats facing the grill. </span>
  <span class="pr-comment__over">Reservations recommended.</span>
  <ul class="rstdtl-navi">
    <li><a id="rating" href="dtlratings/">Ratings</a></li>
    <li><a id="menu" href="dtlmenu/">Menu</a></li>
    <li><a id="photo" href="dtlphotolst/">Photos</a></li>
    <li><a id="review" href="dtlrvwlst/">Reviews</a></li>
  </ul>
  <table class="c-table rstinfo-table__table">
    <tr><th>Restaurant name</th><td> Torikizoku Ginza </td></tr>
    <tr><th>Address</th><td><p>1-2-3 Ginza,
      Chuo-ku, Tokyo</p></td></tr>
    <tr><th>Empty row</th></tr>
  </table>
</body></html>
"#;

pub(crate) const RATINGS_HTML: &str = r#"
<html><body><div class="ratings-contents">
  <dl class="ratings-contents__table">
    <dt class="ratings-contents__table-txt">Dinner</dt>
    <dd class="ratings-contents__table-score">3.58</dd>
    <dt class="ratings-contents__table-txt">Lunch</dt>
    <dd class="ratings-contents__table-score"> 3.21 </dd>
  </dl>
  <ul>
    <li class="ratings-contents__item">
      <b class="c-rating-v2__val c-rating-v2__val--strong ratings-contents__item-score">5.0</b>
      <span class="ratings-contents__item-gauge" style="width: 7%;"></span>
      <strong class="ratings-contents__item-num-strong">12</strong>
    </li>
    <li class="ratings-contents__item">
      <b class="c-rating-v2__val c-rating-v2__val--strong ratings-contents__item-score">4.5 - 4.9</b>
      <span class="ratings-contents__item-gauge"></span>
      <strong class="ratings-contents__item-num-strong">30</strong>
    </li>
    <li class="ratings-contents__item">
      <span class="ratings-contents__item-gauge" style="width: 3%;"></span>
    </li>
  </ul>
</div></body></html>
"#;

pub(crate) const MENU_HTML: &str = r#"
<html><body><div class="rstdtl-menu-lst">
  <h4 class="rstdtl-menu-lst__heading">Skewers</h4>
  <div class="rstdtl-menu-lst__contents">
    <p class="rstdtl-menu-lst__menu-title">Negima</p>
    <p class="rstdtl-menu-lst__price">¥350</p>
  </div>
  <div class="rstdtl-menu-lst__contents">
    <p class="rstdtl-menu-lst__menu-title">Tsukune</p>
  </div>
</div></body></html>
"#;

pub(crate) const PHOTOS_HTML: &str = r#"
<html><body><ul class="rstdtl-photo__list">
  <li><img src="https://tblg.k-img.com/a.jpg"></li>
  <li><img data-original="/img/b.jpg"></li>
  <li><img src="https://tblg.k-img.com/a.jpg"></li>
</ul></body></html>
"#;

pub(crate) const REVIEWS_HTML: &str = r#"
<html><body>
  <div class="rvw-item">
    <a class="rvw-item__rvwr-name">foodie</a>
    <b class="c-rating-v2__val">4.0</b>
    <p class="rvw-item__title">Great yakitori</p>
    <div class="rvw-item__rvw-comment">Crispy skin, <br>friendly staff.</div>
  </div>
  <div class="rvw-item">
    <a class="rvw-item__rvwr-name">anon</a>
    <b class="c-rating-v2__val">-</b>
  </div>
</body></html>
"#;

/// A listing page with the given detail links and optional next link
pub(crate) fn listing(detail_hrefs: &[&str], next_href: Option<&str>) -> String {
    let mut html = String::from("<html><body><div class=\"list-rst\">");
    for href in detail_hrefs {
        html.push_str(&format!(
            "<a class=\"list-rst__rst-name-target\" href=\"{}\">Restaurant</a>",
            href
        ));
    }
    if let Some(next) = next_href {
        html.push_str(&format!(
            "<a class=\"c-pagination__arrow c-pagination__arrow--next\" href=\"{}\">Next</a>",
            next
        ));
    }
    html.push_str("</div></body></html>");
    html
}

